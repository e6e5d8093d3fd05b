use ndarray::Axis;
use tracing::info;

use crate::domain::{Author, KurataMode};
use crate::error::FluxError;
use crate::idmap::IdMap;
use crate::mat::MatFile;
use crate::table::FluxTable;

use super::{FluxLoader, SampleContext};

const FLUX_VARIABLE: &str = "FLUX";
const LUMPED_ID: &str = "Gapdh";
const LUMPED_BIGG: &str = "GAPD";
/// Kurata's Gapdh step lumps gapA with tpiA, gpmA/gpmM, eno and pgk.
const LUMPED_MEMBERS: [&str; 4] = ["TPI", "PGM", "ENO", "PGK"];
const PTS_UPTAKE: &str = "vPts4";
const NON_PTS_UPTAKE: &str = "vNonpts";

/// Kurata et al. `.mat` results: `FLUX` is time points x reactions.
pub struct KurataLoader {
    mode: KurataMode,
}

impl KurataLoader {
    pub fn new(mode: KurataMode) -> Self {
        Self { mode }
    }
}

impl FluxLoader for KurataLoader {
    fn author(&self) -> Author {
        Author::Kurata
    }

    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
        let mat = MatFile::open(sample.path.as_std_path())?;
        let flux = mat.numeric(FLUX_VARIABLE, sample.path.as_str())?;
        info!(
            author = %sample.author,
            sample = %sample.sample_id,
            file = sample.file_name(),
            shape = ?flux.shape(),
            mode = %self.mode,
            "loaded data file"
        );

        let row = self.mode.flux_row();
        if flux.ndim() != 2 || row >= flux.shape()[0] {
            return Err(FluxError::UnexpectedShape {
                name: FLUX_VARIABLE.to_string(),
                shape: flux.shape().to_vec(),
                message: format!("needs a time x reaction matrix with row {row}"),
            });
        }
        let values: Vec<f64> = flux.index_axis(Axis(0), row).iter().copied().collect();

        let ids = id_map.dedup_by_id();
        if values.len() != ids.len() {
            return Err(FluxError::UnexpectedShape {
                name: FLUX_VARIABLE.to_string(),
                shape: flux.shape().to_vec(),
                message: format!(
                    "{} reactions but {} distinct identifiers",
                    values.len(),
                    ids.len()
                ),
            });
        }

        let mut table = FluxTable::new(
            ids.entries()
                .iter()
                .zip(values)
                .map(|(entry, flux)| sample.record(&entry.id, entry.bigg_id.clone(), flux))
                .collect(),
        );

        let lumped = table
            .first_flux_by_bigg(LUMPED_BIGG)
            .ok_or_else(|| sample.missing(LUMPED_BIGG))?;
        for member in LUMPED_MEMBERS {
            table.push(sample.record(LUMPED_ID, Some(member.to_string()), lumped));
        }

        let uptake = sample.require(&table, PTS_UPTAKE)? + sample.require(&table, NON_PTS_UPTAKE)?;
        sample.normalize(&mut table, uptake)?;
        Ok(table)
    }
}
