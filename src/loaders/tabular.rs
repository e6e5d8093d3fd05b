//! Loaders for models whose simulations were exported as `ID,Value` CSV tables.

use camino::Utf8Path;
use tracing::info;

use crate::domain::Author;
use crate::error::FluxError;
use crate::idmap::{IdMap, MODEL_ID_COLUMN};
use crate::table::FluxTable;

use super::{FluxLoader, SampleContext};

const VALUE_COLUMN: &str = "Value";

/// Reads the `ID` and `Value` columns; the unnamed index column and any others are ignored.
/// Empty values read as NaN.
pub fn read_flux_csv(path: &Utf8Path) -> Result<Vec<(String, f64)>, FluxError> {
    let csv_err = |message: String| FluxError::Csv {
        path: path.to_string(),
        message,
    };
    let mut reader =
        csv::Reader::from_path(path.as_std_path()).map_err(|err| csv_err(err.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|err| csv_err(err.to_string()))?
        .clone();
    let id_idx = headers
        .iter()
        .position(|h| h.trim() == MODEL_ID_COLUMN)
        .ok_or_else(|| csv_err(format!("missing '{MODEL_ID_COLUMN}' column")))?;
    let value_idx = headers
        .iter()
        .position(|h| h.trim() == VALUE_COLUMN)
        .ok_or_else(|| csv_err(format!("missing '{VALUE_COLUMN}' column")))?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_err(format!("row {row}: {err}")))?;
        let id = record.get(id_idx).unwrap_or_default().trim().to_string();
        let raw = record.get(value_idx).unwrap_or_default().trim();
        let value = if raw.is_empty() {
            f64::NAN
        } else {
            raw.parse::<f64>()
                .map_err(|err| csv_err(format!("row {row}: value '{raw}': {err}")))?
        };
        rows.push((id, value));
    }
    Ok(rows)
}

fn joined_table(sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
    let rows = read_flux_csv(&sample.path)?;
    info!(
        author = %sample.author,
        sample = %sample.sample_id,
        file = sample.file_name(),
        rows = rows.len(),
        "loaded data file"
    );
    Ok(FluxTable::new(
        id_map
            .left_join(&rows)
            .into_iter()
            .map(|(id, bigg_id, flux)| sample.record(&id, bigg_id, flux))
            .collect(),
    ))
}

/// Millard et al. CSV exports.
pub struct MillardLoader;

impl MillardLoader {
    const QUINONE_MDH: &'static str = "MQO";
    const NAD_MDH: &'static str = "MDH";
    const GLUCOSE_UPTAKE: &'static str = "XCH_GLC";
}

impl FluxLoader for MillardLoader {
    fn author(&self) -> Author {
        Author::Millard
    }

    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
        let mut table = joined_table(sample, id_map)?;

        // The BiGG MDH reaction is the net of the quinone-dependent and NAD-dependent steps.
        let net_mdh =
            sample.require(&table, Self::QUINONE_MDH)? - sample.require(&table, Self::NAD_MDH)?;
        table.set_where_bigg("MDH", net_mdh);

        let uptake = sample.require(&table, Self::GLUCOSE_UPTAKE)?;
        sample.normalize(&mut table, uptake)?;
        Ok(table)
    }
}

/// Kotte et al. CSV exports. Fluxes are reported as-is with no normalization.
pub struct KotteLoader;

impl FluxLoader for KotteLoader {
    fn author(&self) -> Author {
        Author::Kotte
    }

    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
        joined_table(sample, id_map)
    }
}

/// Chassagnole et al. CSV exports.
pub struct ChassagnoleLoader;

impl FluxLoader for ChassagnoleLoader {
    fn author(&self) -> Author {
        Author::Chassagnole
    }

    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
        let mut table = joined_table(sample, id_map)?;
        let uptake = sample.require(&table, "vPTS")?;
        sample.normalize(&mut table, uptake)?;
        Ok(table)
    }
}
