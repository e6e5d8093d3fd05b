//! Per-model flux loaders.
//!
//! Every loader follows the same path per sample: read one file, attach BiGG
//! identifiers, apply the model's sign/unit corrections, then normalize to
//! glucose uptake. Samples are validated against the catalog before any file
//! is opened.

mod khodayari;
mod kurata;
mod tabular;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::catalog::SampleCatalog;
use crate::domain::{Author, Experiment, KurataMode, SampleCondition, SampleSelection};
use crate::error::FluxError;
use crate::idmap::IdMap;
use crate::table::{FluxRecord, FluxTable};

pub use khodayari::{KHODAYARI_REACTION_COUNT, KhodayariLoader};
pub use kurata::KurataLoader;
pub use tabular::{ChassagnoleLoader, KotteLoader, MillardLoader, read_flux_csv};

pub trait FluxLoader {
    fn author(&self) -> Author;
    fn load_sample(&self, sample: &SampleContext, id_map: &IdMap) -> Result<FluxTable, FluxError>;
}

pub fn loader_for(author: Author, mode: KurataMode) -> Box<dyn FluxLoader> {
    match author {
        Author::Khodayari => Box::new(KhodayariLoader),
        Author::Kurata => Box::new(KurataLoader::new(mode)),
        Author::Millard => Box::new(MillardLoader),
        Author::Kotte => Box::new(KotteLoader),
        Author::Chassagnole => Box::new(ChassagnoleLoader),
    }
}

/// Everything a loader needs to know about the sample it is reading.
#[derive(Debug, Clone)]
pub struct SampleContext {
    pub author: Author,
    pub sample_id: String,
    pub condition: SampleCondition,
    pub path: Utf8PathBuf,
}

impl SampleContext {
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    pub fn record(&self, id: &str, bigg_id: Option<String>, flux: f64) -> FluxRecord {
        FluxRecord {
            author: self.author,
            sample_id: self.sample_id.clone(),
            condition: self.condition.to_string(),
            id: id.to_string(),
            bigg_id,
            flux,
            normalized_flux: None,
        }
    }

    pub fn missing(&self, id: &str) -> FluxError {
        FluxError::MissingReaction {
            author: self.author,
            sample: self.sample_id.clone(),
            id: id.to_string(),
        }
    }

    pub fn require(&self, table: &FluxTable, id: &str) -> Result<f64, FluxError> {
        table.first_flux(id).ok_or_else(|| self.missing(id))
    }

    pub fn normalize(&self, table: &mut FluxTable, uptake: f64) -> Result<(), FluxError> {
        if uptake == 0.0 || !uptake.is_finite() {
            return Err(FluxError::DegenerateUptake {
                author: self.author,
                sample: self.sample_id.clone(),
                uptake,
            });
        }
        table.normalize_to(uptake);
        Ok(())
    }
}

pub struct LoadRequest<'a> {
    pub experiment: Experiment,
    pub selection: &'a SampleSelection,
    pub catalog: &'a SampleCatalog,
    pub dir: &'a Utf8Path,
    pub id_map: &'a IdMap,
}

/// Loads every selected sample with `loader` and concatenates them in selection order.
pub fn load_samples(loader: &dyn FluxLoader, request: &LoadRequest<'_>) -> Result<FluxTable, FluxError> {
    let samples = request.catalog.select(request.selection)?;
    let mut table = FluxTable::default();
    for (sample_id, file) in samples {
        let context = SampleContext {
            author: loader.author(),
            condition: SampleCondition::classify(request.experiment, &sample_id),
            sample_id,
            path: request.dir.join(&file),
        };
        debug!(author = %context.author, sample = %context.sample_id, path = %context.path, "loading sample");
        table.extend(loader.load_sample(&context, request.id_map)?);
    }
    Ok(table)
}
