use ndarray::Axis;
use tracing::{info, warn};

use crate::domain::Author;
use crate::error::FluxError;
use crate::idmap::IdMap;
use crate::mat::MatFile;
use crate::table::FluxTable;

use super::{FluxLoader, SampleContext};

/// Rows of `Vnet` that carry reaction fluxes; the last one is biomass.
pub const KHODAYARI_REACTION_COUNT: usize = 457;

const FLUX_VARIABLE: &str = "Vnet";
const GLUCOSE_UPTAKE: &str = "EX_glc(e)";
const REVERSED_REACTIONS: [&str; 3] = ["PGM", "PGK", "RPI"];

/// Khodayari et al. `.mat` results: `Vnet` is reactions x integration time points.
pub struct KhodayariLoader;

impl FluxLoader for KhodayariLoader {
    fn author(&self) -> Author {
        Author::Khodayari
    }

    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError> {
        let mat = MatFile::open(sample.path.as_std_path())?;
        let array = mat.array(FLUX_VARIABLE, sample.path.as_str())?;
        let vnet = &array.data;
        info!(
            author = %sample.author,
            sample = %sample.sample_id,
            file = sample.file_name(),
            shape = ?vnet.shape(),
            "loaded data file"
        );

        // The last integration time point is the closest to steady state.
        let steady: Vec<f64> = match vnet.ndim() {
            // A single stored row is one reaction over time; keep its last point.
            0 | 1 if array.dims.first() == Some(&1) => {
                vnet.iter().last().copied().into_iter().collect()
            }
            0 | 1 => vnet.iter().copied().collect(),
            2 if vnet.shape()[1] > 0 => vnet
                .index_axis(Axis(1), vnet.shape()[1] - 1)
                .iter()
                .copied()
                .collect(),
            _ => {
                return Err(FluxError::UnexpectedShape {
                    name: FLUX_VARIABLE.to_string(),
                    shape: array.dims.clone(),
                    message: "expected reactions x time points".to_string(),
                });
            }
        };

        if id_map.len() != KHODAYARI_REACTION_COUNT {
            warn!(
                rows = id_map.len(),
                expected = KHODAYARI_REACTION_COUNT,
                "Khodayari identifier map size differs from the model's reaction count"
            );
        }
        if steady.len() < id_map.len() {
            return Err(FluxError::UnexpectedShape {
                name: FLUX_VARIABLE.to_string(),
                shape: array.dims.clone(),
                message: format!("needs at least {} reaction rows", id_map.len()),
            });
        }

        let mut table = FluxTable::new(
            id_map
                .entries()
                .iter()
                .zip(steady)
                .map(|(entry, flux)| sample.record(&entry.id, entry.bigg_id.clone(), flux))
                .collect(),
        );

        for id in REVERSED_REACTIONS {
            if !table.negate_first(id) {
                return Err(sample.missing(id));
            }
        }

        let uptake = sample.require(&table, GLUCOSE_UPTAKE)?;
        sample.normalize(&mut table, uptake)?;
        Ok(table)
    }
}
