mod common;

use approx::assert_relative_eq;
use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use flux_harmonizer::catalog::SampleCatalog;
use flux_harmonizer::domain::{Author, Experiment, KurataMode, SampleSelection};
use flux_harmonizer::error::FluxError;
use flux_harmonizer::idmap::IdMap;
use flux_harmonizer::loaders::{LoadRequest, load_samples, loader_for};
use flux_harmonizer::table::{FluxRecord, FluxTable};

use common::{compressed, double_matrix, mat_file};

fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, dir)
}

fn id_map(csv: &str) -> IdMap {
    IdMap::from_reader(csv.as_bytes(), "inline").unwrap()
}

fn load(
    author: Author,
    mode: KurataMode,
    experiment: Experiment,
    catalog: &SampleCatalog,
    selection: SampleSelection,
    dir: &Utf8Path,
    ids: &IdMap,
) -> Result<FluxTable, FluxError> {
    let loader = loader_for(author, mode);
    load_samples(
        loader.as_ref(),
        &LoadRequest {
            experiment,
            selection: &selection,
            catalog,
            dir,
            id_map: ids,
        },
    )
}

fn find<'a>(table: &'a FluxTable, id: &str) -> &'a FluxRecord {
    table
        .records()
        .iter()
        .find(|record| record.id == id)
        .unwrap_or_else(|| panic!("no row for {id}"))
}

const KHODAYARI_IDS: &str = "ID,BiGG ID\nEX_glc(e),EX_glc__D_e\nPGM,PGM\nPGK,PGK\nRPI,RPI\nPGI,PGI\nBiomass,\n";

#[test]
fn khodayari_takes_last_time_point_and_flips_reversed_steps() {
    let (_temp, dir) = temp_dir();
    // 7 reactions x 2 time points; the trailing row is beyond the identifier map.
    let vnet = [
        1.0, 10.0, //
        1.0, 2.0, //
        1.0, 3.0, //
        1.0, 4.0, //
        1.0, 5.0, //
        1.0, 6.0, //
        1.0, 99.0,
    ];
    std::fs::write(
        dir.join("result_cont_WT.mat"),
        mat_file(&[compressed(&double_matrix("Vnet", 7, 2, &vnet))]),
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Khodayari, Experiment::Knockouts).unwrap();
    let table = load(
        Author::Khodayari,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::from_names(["WT"]),
        &dir,
        &id_map(KHODAYARI_IDS),
    )
    .unwrap();

    assert_eq!(table.len(), 6);
    assert_eq!(find(&table, "PGM").flux, -2.0);
    assert_eq!(find(&table, "PGK").flux, -3.0);
    assert_eq!(find(&table, "RPI").flux, -4.0);
    assert_eq!(find(&table, "PGI").flux, 5.0);
    assert_relative_eq!(find(&table, "EX_glc(e)").normalized_flux.unwrap(), 100.0);
    assert_relative_eq!(find(&table, "PGM").normalized_flux.unwrap(), -20.0);
    assert_eq!(find(&table, "Biomass").bigg_id, None);
    assert_eq!(find(&table, "PGI").condition, "wild-type");
    assert_eq!(find(&table, "PGI").author, Author::Khodayari);
}

#[test]
fn khodayari_requires_reversed_reactions() {
    let (_temp, dir) = temp_dir();
    std::fs::write(
        dir.join("WT.mat"),
        mat_file(&[double_matrix("Vnet", 2, 1, &[10.0, 2.0])]),
    )
    .unwrap();
    let catalog = SampleCatalog::from_pairs([("WT", "WT.mat")]);
    let err = load(
        Author::Khodayari,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::All,
        &dir,
        &id_map("ID,BiGG ID\nEX_glc(e),EX_glc__D_e\nPGK,PGK\n"),
    )
    .unwrap_err();
    assert_matches!(err, FluxError::MissingReaction { ref id, .. } if id == "PGM");
}

const KURATA_IDS: &str =
    "ID,BiGG ID\nvPts4,GLCptspp\nvNonpts,GLCt2pp\nGapdh,GAPD\nGapdh,PGK\nvPfk,PFK\n";

fn kurata_flux(rows: usize, sampled_row: usize, values: &[f64]) -> Vec<f64> {
    let mut data = vec![0.0; rows * values.len()];
    data[sampled_row * values.len()..(sampled_row + 1) * values.len()].copy_from_slice(values);
    data
}

#[test]
fn kurata_batch_row_and_lumped_gapdh() {
    let (_temp, dir) = temp_dir();
    let flux = kurata_flux(152, 151, &[6.0, 2.0, 16.0, 8.0]);
    std::fs::write(
        dir.join("result_batch_Delta_pgi.mat"),
        mat_file(&[compressed(&double_matrix("FLUX", 152, 4, &flux))]),
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Kurata, Experiment::BatchKnockouts).unwrap();
    let table = load(
        Author::Kurata,
        KurataMode::Batch,
        Experiment::BatchKnockouts,
        &catalog,
        SampleSelection::from_names(["pgi"]),
        &dir,
        &id_map(KURATA_IDS),
    )
    .unwrap();

    // Four distinct identifiers plus the four Gapdh-derived rows.
    assert_eq!(table.len(), 8);
    let lumped: Vec<&str> = table
        .records()
        .iter()
        .filter(|record| record.id == "Gapdh")
        .filter_map(|record| record.bigg_id.as_deref())
        .collect();
    assert_eq!(lumped, vec!["GAPD", "TPI", "PGM", "ENO", "PGK"]);
    for record in table.records().iter().filter(|record| record.id == "Gapdh") {
        assert_eq!(record.flux, 16.0);
        assert_relative_eq!(record.normalized_flux.unwrap(), 200.0);
    }
    assert_relative_eq!(find(&table, "vPfk").normalized_flux.unwrap(), 100.0);
    assert_eq!(find(&table, "vPfk").condition, "knockout:pgi");
}

#[test]
fn kurata_continuous_row_must_exist() {
    let (_temp, dir) = temp_dir();
    let flux = kurata_flux(152, 151, &[6.0, 2.0, 16.0, 8.0]);
    std::fs::write(
        dir.join("WT.mat"),
        mat_file(&[double_matrix("FLUX", 152, 4, &flux)]),
    )
    .unwrap();
    let catalog = SampleCatalog::from_pairs([("WT", "WT.mat")]);
    let err = load(
        Author::Kurata,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::All,
        &dir,
        &id_map(KURATA_IDS),
    )
    .unwrap_err();
    assert_matches!(err, FluxError::UnexpectedShape { .. });
}

#[test]
fn kurata_continuous_samples_row_2100() {
    let (_temp, dir) = temp_dir();
    let mut flux = kurata_flux(2101, 2100, &[3.0, 1.0, 8.0, 2.0]);
    // Earlier rows must not be picked up.
    flux[151 * 4..152 * 4].copy_from_slice(&[9.0, 9.0, 9.0, 9.0]);
    std::fs::write(
        dir.join("result_cont_Delta_pgi.mat"),
        mat_file(&[compressed(&double_matrix("FLUX", 2101, 4, &flux))]),
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Kurata, Experiment::Knockouts).unwrap();
    let table = load(
        Author::Kurata,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::from_names(["pgi"]),
        &dir,
        &id_map(KURATA_IDS),
    )
    .unwrap();

    assert_eq!(table.len(), 8);
    assert_eq!(find(&table, "vPts4").flux, 3.0);
    assert_relative_eq!(find(&table, "vPfk").normalized_flux.unwrap(), 50.0);
    assert_relative_eq!(find(&table, "Gapdh").normalized_flux.unwrap(), 200.0);
}

#[test]
fn khodayari_single_time_point_column() {
    let (_temp, dir) = temp_dir();
    std::fs::write(
        dir.join("WT.mat"),
        mat_file(&[double_matrix("Vnet", 6, 1, &[10.0, 2.0, 3.0, 4.0, 5.0, 6.0])]),
    )
    .unwrap();
    let catalog = SampleCatalog::from_pairs([("WT", "WT.mat")]);
    let table = load(
        Author::Khodayari,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::All,
        &dir,
        &id_map(KHODAYARI_IDS),
    )
    .unwrap();
    assert_eq!(find(&table, "PGI").flux, 5.0);
    assert_eq!(find(&table, "PGM").flux, -2.0);
}

#[test]
fn khodayari_single_row_is_one_reaction_over_time() {
    let (_temp, dir) = temp_dir();
    // 1 x 6: one reaction sampled at six time points, not six reactions.
    std::fs::write(
        dir.join("WT.mat"),
        mat_file(&[double_matrix("Vnet", 1, 6, &[10.0, 2.0, 3.0, 4.0, 5.0, 6.0])]),
    )
    .unwrap();
    let catalog = SampleCatalog::from_pairs([("WT", "WT.mat")]);
    let err = load(
        Author::Khodayari,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::All,
        &dir,
        &id_map(KHODAYARI_IDS),
    )
    .unwrap_err();
    assert_matches!(err, FluxError::UnexpectedShape { ref shape, .. } if shape == &vec![1, 6]);
}

const MILLARD_IDS: &str =
    "ID,BiGG ID\nXCH_GLC,EX_glc__D_e\nMQO,MDH2\nMDH,MDH\nPGI,PGI\nPGI,PGI_alt\n";

#[test]
fn millard_nets_malate_dehydrogenase() {
    let (_temp, dir) = temp_dir();
    std::fs::write(
        dir.join("Millard_result_WT.csv"),
        ",ID,Value\n0,XCH_GLC,5\n1,MQO,3\n2,MDH,1\n3,PGI,4\n4,ORPHAN,1\n",
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Millard, Experiment::Knockouts).unwrap();
    let table = load(
        Author::Millard,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::from_names(["WT"]),
        &dir,
        &id_map(MILLARD_IDS),
    )
    .unwrap();

    // PGI fans out to two BiGG ids through the left join.
    assert_eq!(table.len(), 6);
    let mdh = table
        .records()
        .iter()
        .find(|record| record.bigg_id.as_deref() == Some("MDH"))
        .unwrap();
    assert_eq!(mdh.flux, 2.0);
    assert_relative_eq!(mdh.normalized_flux.unwrap(), 40.0);
    assert_relative_eq!(find(&table, "PGI").normalized_flux.unwrap(), 80.0);
    assert_eq!(find(&table, "ORPHAN").bigg_id, None);
}

#[test]
fn kotte_is_not_normalized() {
    let (_temp, dir) = temp_dir();
    std::fs::write(
        dir.join("Kotte_result_Delta_pts.csv"),
        ",ID,Value\n0,vPTS,0\n1,vPK,2.5\n",
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Kotte, Experiment::Knockouts).unwrap();
    let table = load(
        Author::Kotte,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::from_names(["pts"]),
        &dir,
        &id_map("ID,BiGG ID\nvPK,PYK\n"),
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(find(&table, "vPK").bigg_id.as_deref(), Some("PYK"));
    assert!(table.records().iter().all(|record| record.normalized_flux.is_none()));
}

#[test]
fn chassagnole_normalizes_to_pts_and_concatenates_samples() {
    let (_temp, dir) = temp_dir();
    std::fs::write(
        dir.join("chassagnole_pgi(20).csv"),
        ",ID,Value\n0,vPTS,0.2\n1,vPGI,0.1\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("chassagnole_sens_WT.csv"),
        ",ID,Value\n0,vPTS,0.25\n1,vPGI,0.2\n",
    )
    .unwrap();

    let catalog = SampleCatalog::builtin(Author::Chassagnole, Experiment::Pgi).unwrap();
    let table = load(
        Author::Chassagnole,
        KurataMode::Continuous,
        Experiment::Pgi,
        &catalog,
        SampleSelection::from_names(["pgi(20)", "WT"]),
        &dir,
        &id_map("ID,BiGG ID\nvPTS,GLCptspp\nvPGI,PGI\n"),
    )
    .unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.samples(Author::Chassagnole), vec!["pgi(20)", "WT"]);
    let pgi: Vec<f64> = table
        .records()
        .iter()
        .filter(|record| record.id == "vPGI")
        .filter_map(|record| record.normalized_flux)
        .collect();
    assert_relative_eq!(pgi[0], 50.0);
    assert_relative_eq!(pgi[1], 80.0);
    assert_eq!(table.records()[0].condition, "expression:pgi@20");
}

#[test]
fn zero_uptake_cannot_be_normalized() {
    let (_temp, dir) = temp_dir();
    std::fs::write(dir.join("WT.csv"), ",ID,Value\n0,vPTS,0\n").unwrap();
    let catalog = SampleCatalog::from_pairs([("WT", "WT.csv")]);
    let err = load(
        Author::Chassagnole,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::All,
        &dir,
        &id_map("ID,BiGG ID\nvPTS,GLCptspp\n"),
    )
    .unwrap_err();
    assert_matches!(err, FluxError::DegenerateUptake { .. });
}

#[test]
fn unknown_samples_fail_before_reading_files() {
    let (_temp, dir) = temp_dir();
    let catalog = SampleCatalog::builtin(Author::Millard, Experiment::Knockouts).unwrap();
    let err = load(
        Author::Millard,
        KurataMode::Continuous,
        Experiment::Knockouts,
        &catalog,
        SampleSelection::from_names(["WT", "fbaA", "tpi"]),
        &dir,
        &id_map(MILLARD_IDS),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Unable to find relevant data for fbaA, tpi");
}
