use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::SampleCatalog;
use crate::domain::{Author, Experiment, KurataMode, SampleSelection, SourceSpec};
use crate::error::FluxError;
use crate::output::OutputFormat;

pub const DEFAULT_CONFIG_FILE: &str = "flux-harmonizer.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub id_maps: BTreeMap<String, String>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Detailed(SourceEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SourceEntryObject {
    pub author: String,
    pub experiment: String,
    #[serde(default)]
    pub samples: Option<SamplesEntry>,
    #[serde(default)]
    pub mode: Option<KurataMode>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub files: Option<IndexMap<String, String>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SamplesEntry {
    One(String),
    Many(Vec<String>),
}

impl SamplesEntry {
    fn into_selection(self) -> SampleSelection {
        match self {
            SamplesEntry::One(name) => SampleSelection::from_names([name]),
            SamplesEntry::Many(names) => SampleSelection::from_names(names),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub spec: SourceSpec,
    pub selection: SampleSelection,
    pub mode: KurataMode,
    pub dir: Utf8PathBuf,
    pub catalog: SampleCatalog,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Utf8PathBuf,
    pub output: Option<Utf8PathBuf>,
    pub format: OutputFormat,
    pub id_maps: BTreeMap<Author, Utf8PathBuf>,
    pub sources: Vec<SourceRequest>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FluxError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(FluxError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FluxError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FluxError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FluxError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let data_dir = Utf8PathBuf::from(config.data_dir.unwrap_or_else(|| ".".to_string()));

        let id_maps = config
            .id_maps
            .into_iter()
            .map(|(author, path)| Ok((author.parse::<Author>()?, Utf8PathBuf::from(path))))
            .collect::<Result<BTreeMap<_, _>, FluxError>>()?;

        let sources = config
            .sources
            .into_iter()
            .map(|entry| match entry {
                SourceEntry::Shorthand(value) => {
                    let spec: SourceSpec = value.parse()?;
                    Ok(SourceRequest {
                        spec,
                        selection: SampleSelection::All,
                        mode: KurataMode::for_experiment(spec.experiment),
                        dir: data_dir.join(spec.author.dir_name()),
                        catalog: SampleCatalog::builtin(spec.author, spec.experiment)?,
                    })
                }
                SourceEntry::Detailed(obj) => {
                    let spec = SourceSpec {
                        author: obj.author.parse()?,
                        experiment: obj.experiment.parse::<Experiment>()?,
                    };
                    let catalog = match obj.files {
                        Some(files) => SampleCatalog::from_pairs(files),
                        None => SampleCatalog::builtin(spec.author, spec.experiment)?,
                    };
                    Ok(SourceRequest {
                        spec,
                        selection: obj
                            .samples
                            .map(SamplesEntry::into_selection)
                            .unwrap_or_default(),
                        mode: obj
                            .mode
                            .unwrap_or_else(|| KurataMode::for_experiment(spec.experiment)),
                        dir: obj
                            .dir
                            .map(Utf8PathBuf::from)
                            .unwrap_or_else(|| data_dir.join(spec.author.dir_name())),
                        catalog,
                    })
                }
            })
            .collect::<Result<Vec<_>, FluxError>>()?;

        if let Some(source) = sources
            .iter()
            .find(|source| !id_maps.contains_key(&source.spec.author))
        {
            return Err(FluxError::MissingIdMap(source.spec.author));
        }

        Ok(ResolvedConfig {
            schema_version,
            data_dir,
            output: config.output.map(Utf8PathBuf::from),
            format: config.format.unwrap_or_default(),
            id_maps,
            sources,
        })
    }
}
