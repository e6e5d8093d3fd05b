//! Static sample-name to file-name tables for every published simulation set.
//!
//! Table order matters: selecting `all` walks the entries in the order listed here.

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::{Author, Experiment, SampleSelection};
use crate::error::FluxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleCatalog {
    files: IndexMap<String, String>,
}

impl SampleCatalog {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: pairs
                .into_iter()
                .map(|(sample, file)| (sample.into(), file.into()))
                .collect(),
        }
    }

    pub fn builtin(author: Author, experiment: Experiment) -> Result<Self, FluxError> {
        let pairs: Vec<(String, String)> = match (author, experiment) {
            (Author::Khodayari, Experiment::Knockouts) => owned(KHODAYARI_KNOCKOUTS),
            (Author::Khodayari, Experiment::BatchKnockouts) => {
                let mut pairs = owned(KHODAYARI_KNOCKOUTS);
                pairs.extend(owned(&[
                    ("eda", "result_cont_Delta_eda.mat"),
                    ("edd", "result_cont_Delta_edd.mat"),
                ]));
                pairs
            }
            (Author::Millard, Experiment::Knockouts) => owned(MILLARD_KNOCKOUTS),
            (Author::Millard, Experiment::BatchKnockouts) => {
                let mut pairs = owned(MILLARD_KNOCKOUTS);
                pairs.extend(owned(&[
                    ("eda", "Millard_result_Delta_eda.csv"),
                    ("edd", "Millard_result_Delta_edd.csv"),
                ]));
                pairs
            }
            (Author::Kurata, Experiment::Knockouts) => owned(KURATA_KNOCKOUTS),
            (Author::Kurata, Experiment::BatchKnockouts) => owned(KURATA_BATCH_KNOCKOUTS),
            (Author::Kotte, Experiment::Knockouts) => owned(KOTTE_KNOCKOUTS),
            (Author::Chassagnole, Experiment::Knockouts) => owned(CHASSAGNOLE_KNOCKOUTS),

            (Author::Khodayari | Author::Kurata | Author::Millard, Experiment::Zwf) => {
                sensitivity(author, "zwf", ZWF_SAMPLES)
            }
            (Author::Khodayari | Author::Kurata | Author::Millard, Experiment::Pgi) => {
                sensitivity(author, "pgi", PGI_SAMPLES)
            }
            (Author::Khodayari | Author::Kurata | Author::Millard, Experiment::Eno) => {
                sensitivity(author, "eno", ENO_SAMPLES)
            }
            (Author::Chassagnole, Experiment::Zwf) => chassagnole_sensitivity(ZWF_SAMPLES),
            (Author::Chassagnole, Experiment::Pgi) => chassagnole_sensitivity(PGI_SAMPLES),
            (Author::Chassagnole, Experiment::Eno) => chassagnole_sensitivity(ENO_SAMPLES),

            (Author::Khodayari | Author::Kurata | Author::Millard, Experiment::Dilution) => {
                DILUTION_RATES
                    .iter()
                    .map(|rate| {
                        (
                            rate.to_string(),
                            format!(
                                "{}_dilution_{}.{}",
                                author.dir_name(),
                                rate.replace('.', ""),
                                extension(author)
                            ),
                        )
                    })
                    .collect()
            }
            (Author::Chassagnole, Experiment::Dilution) => DILUTION_RATES
                .iter()
                .map(|rate| {
                    (
                        rate.to_string(),
                        format!("Chassagnole_result_{}.csv", rate.replace('.', "")),
                    )
                })
                .collect(),

            _ => return Err(FluxError::UnsupportedExperiment { author, experiment }),
        };
        Ok(Self::from_pairs(pairs))
    }

    pub fn file_for(&self, sample: &str) -> Option<&str> {
        self.files.get(sample).map(String::as_str)
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(sample, file)| (sample.as_str(), file.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolves a selection into `(sample, file)` pairs, rejecting names the table
    /// does not know. Unknown names are reported in request order.
    pub fn select(&self, selection: &SampleSelection) -> Result<Vec<(String, String)>, FluxError> {
        match selection {
            SampleSelection::All => Ok(self
                .entries()
                .map(|(sample, file)| (sample.to_string(), file.to_string()))
                .collect()),
            SampleSelection::Named(names) => {
                let unknown: Vec<&str> = names
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !self.files.contains_key(*name))
                    .collect();
                if !unknown.is_empty() {
                    return Err(FluxError::UnknownSamples(unknown.join(", ")));
                }
                Ok(names
                    .iter()
                    .map(|name| (name.clone(), self.files[name.as_str()].clone()))
                    .collect())
            }
        }
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(sample, file)| (sample.to_string(), file.to_string()))
        .collect()
}

fn extension(author: Author) -> &'static str {
    match author.file_format() {
        crate::domain::FileFormat::Mat => "mat",
        crate::domain::FileFormat::Csv => "csv",
    }
}

fn sensitivity(author: Author, enzyme: &str, samples: &[&str]) -> Vec<(String, String)> {
    samples
        .iter()
        .map(|sample| {
            (
                sample.to_string(),
                format!(
                    "{}_{enzyme}_sens_{sample}.{}",
                    author.dir_name(),
                    extension(author)
                ),
            )
        })
        .collect()
}

fn chassagnole_sensitivity(samples: &[&str]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = samples
        .iter()
        .filter(|sample| **sample != "WT")
        .map(|sample| (sample.to_string(), format!("chassagnole_{sample}.csv")))
        .collect();
    pairs.push(("WT".to_string(), "chassagnole_sens_WT.csv".to_string()));
    pairs
}

const ZWF_SAMPLES: &[&str] = &["dzwf", "WT", "zwf(15)"];
const PGI_SAMPLES: &[&str] = &["dpgi", "pgi(0)", "pgi(20)", "pgi(50)", "pgi(100)", "WT"];
const ENO_SAMPLES: &[&str] = &["eno(0)", "eno(50)", "eno(200)", "eno(500)", "WT"];
const DILUTION_RATES: &[&str] = &["0.2", "0.4", "0.6", "0.7"];

const KHODAYARI_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbaA", "result_cont_Delta_fbaAB.mat"),
    ("fbaB", "result_cont_Delta_fbaAB.mat"),
    ("fbp", "result_cont_Delta_fbp.mat"),
    ("gnd", "result_cont_Delta_gnd.mat"),
    ("pfkA", "result_cont_Delta_pfkAB.mat"),
    ("pfkB", "result_cont_Delta_pfkAB.mat"),
    ("pgi", "result_cont_Delta_pgi.mat"),
    ("pgl", "result_cont_Delta_pgl.mat"),
    ("ppsA", "result_cont_Delta_ppsA.mat"),
    ("pykA", "result_cont_Delta_pykA.mat"),
    ("pykF", "result_cont_Delta_pykF.mat"),
    ("rpe", "result_cont_Delta_rpe.mat"),
    ("rpiA", "result_cont_Delta_rpiAB.mat"),
    ("rpiB", "result_cont_Delta_rpiAB.mat"),
    ("sucA", "result_cont_Delta_sucAB.mat"),
    ("talA", "result_cont_Delta_talAB.mat"),
    ("tktA", "result_cont_Delta_tktAB.mat"),
    ("tktB", "result_cont_Delta_tktAB.mat"),
    ("tpi", "result_cont_Delta_tpi.mat"),
    ("zwf", "result_cont_Delta_zwf.mat"),
    ("WT", "result_cont_WT.mat"),
];

const MILLARD_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbp", "Millard_result_Delta_fbp.csv"),
    ("gnd", "Millard_result_Delta_gnd.csv"),
    ("pgi", "Millard_result_Delta_pgi.csv"),
    ("pgl", "Millard_result_Delta_pgl.csv"),
    ("ppsA", "Millard_result_Delta_pps.csv"),
    ("pykA", "Millard_result_Delta_pyk.csv"),
    ("pykF", "Millard_result_Delta_pyk.csv"),
    ("rpe", "Millard_result_Delta_rpe.csv"),
    ("rpiA", "Millard_result_Delta_rpi.csv"),
    ("rpiB", "Millard_result_Delta_rpi.csv"),
    ("sdhCD", "Millard_result_Delta_sdh.csv"),
    ("talAB", "Millard_result_Delta_tal.csv"),
    ("tktA", "Millard_result_Delta_tkt1.csv"),
    ("zwf", "Millard_result_Delta_zwf.csv"),
    ("WT", "Millard_result_WT.csv"),
];

const KURATA_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbaA", "result_cont_Delta_fbaB.mat"),
    ("fbaB", "result_cont_Delta_fbaB.mat"),
    ("fbp", "result_cont_Delta_fbp.mat"),
    ("gnd", "result_cont_Delta_gnd.mat"),
    ("pfkA", "result_cont_Delta_pfkA.mat"),
    ("pfkB", "result_cont_Delta_pfkB.mat"),
    ("pgi", "result_cont_Delta_pgi.mat"),
    ("ppc", "result_cont_Delta_ppc.mat"),
    ("ppsA", "result_cont_Delta_ppsA.mat"),
    ("pts", "result_cont_Delta_pts.mat"),
    ("pykA", "result_cont_Delta_pykA.mat"),
    ("pykF", "result_cont_Delta_pykF.mat"),
    ("rpiA", "result_cont_Delta_rpiA.mat"),
    ("rpiB", "result_cont_Delta_rpiB.mat"),
    ("sdhCD", "result_cont_Delta_sdhC.mat"),
    ("sucA", "result_cont_Delta_sucAC.mat"),
    ("talA", "result_cont_Delta_talA.mat"),
    ("talB", "result_cont_Delta_talB.mat"),
    ("tktA", "result_cont_Delta_tktA.mat"),
    ("tktB", "result_cont_Delta_tktB.mat"),
    ("tpi", "result_cont_Delta_tpi.mat"),
    ("zwf", "result_cont_Delta_zwf.mat"),
    ("glk", "result_cont_Delta_glk.mat"),
    ("WT", "result_cont_WT.mat"),
];

const KURATA_BATCH_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbaA", "result_batch_Delta_fbaB.mat"),
    ("fbp", "result_batch_Delta_fbp.mat"),
    ("gnd", "result_batch_Delta_gnd.mat"),
    ("pfkA", "result_batch_Delta_pfkA.mat"),
    ("pfkB", "result_batch_Delta_pfkB.mat"),
    ("pgi", "result_batch_Delta_pgi.mat"),
    ("ppc", "result_batch_Delta_ppc.mat"),
    ("ppsA", "result_batch_Delta_ppsA.mat"),
    ("pts", "result_batch_Delta_pts.mat"),
    ("pykA", "result_batch_Delta_pykA.mat"),
    ("pykF", "result_batch_Delta_pykF.mat"),
    ("rpiA", "result_batch_Delta_rpiA.mat"),
    ("rpiB", "result_batch_Delta_rpiB.mat"),
    ("sdhCD", "result_batch_Delta_sdhC.mat"),
    ("sucA", "result_batch_Delta_sucAC.mat"),
    ("talA", "result_batch_Delta_talA.mat"),
    ("talB", "result_batch_Delta_talB.mat"),
    ("tktA", "result_batch_Delta_tktA.mat"),
    ("tktB", "result_batch_Delta_tktB.mat"),
    ("tpi", "result_batch_Delta_tpi.mat"),
    ("zwf", "result_batch_Delta_zwf.mat"),
    ("glk", "result_batch_Delta_glk.mat"),
    ("eda", "result_batch_Delta_eda.mat"),
    ("edd", "result_batch_Delta_edd.mat"),
    ("WT", "result_batch_RF06.mat"),
];

const KOTTE_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbaAB", "Kotte_result_Delta_fba.csv"),
    ("fbp", "Kotte_result_Delta_fbp.csv"),
    ("pfkA", "Kotte_result_Delta_pfk.csv"),
    ("ppsA", "Kotte_result_Delta_pps.csv"),
    ("pts", "Kotte_result_Delta_pts.csv"),
    ("pykF", "Kotte_result_Delta_pyk.csv"),
];

const CHASSAGNOLE_KNOCKOUTS: &[(&str, &str)] = &[
    ("fbaA", "Chassagnole_result_Delta_fba.csv"),
    ("fbaB", "Chassagnole_result_Delta_fba.csv"),
    ("gnd", "Chassagnole_result_Delta_gnd.csv"),
    ("pfkA", "Chassagnole_result_Delta_pfk.csv"),
    ("pfkB", "Chassagnole_result_Delta_pfk.csv"),
    ("pgi", "Chassagnole_result_Delta_pgi.csv"),
    ("pykA", "Chassagnole_result_Delta_pyk.csv"),
    ("pykF", "Chassagnole_result_Delta_pyk.csv"),
    ("rpe", "Chassagnole_result_Delta_rpe.csv"),
    ("rpiA", "Chassagnole_result_Delta_rpi.csv"),
    ("rpiB", "Chassagnole_result_Delta_rpi.csv"),
    ("talA", "Chassagnole_result_Delta_tal.csv"),
    ("talB", "Chassagnole_result_Delta_tal.csv"),
    ("tkt1", "Chassagnole_result_Delta_tkt1.csv"),
    ("tkt2", "Chassagnole_result_Delta_tkt2.csv"),
    ("tpi", "Chassagnole_result_Delta_tpi.csv"),
    ("zwf", "Chassagnole_result_Delta_zwf.csv"),
    ("WT", "Chassagnole_result_WT.csv"),
];
