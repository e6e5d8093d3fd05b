use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::catalog::SampleCatalog;
use crate::config::ResolvedConfig;
use crate::domain::{Author, Experiment};
use crate::error::FluxError;
use crate::idmap::IdMap;
use crate::loaders::{LoadRequest, load_samples, loader_for};
use crate::mat::{MatFile, VariableSummary};
use crate::output::OutputFormat;
use crate::store::{Metadata, SourceMetadata, Store};
use crate::table::FluxTable;

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub dir: String,
    pub samples: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct HarmonizeResult {
    pub table: FluxTable,
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub sample: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogResult {
    pub author: String,
    pub experiment: String,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub description: String,
    pub variables: Vec<VariableSummary>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Default)]
pub struct App;

impl App {
    pub fn new() -> Self {
        Self
    }

    pub fn harmonize(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<HarmonizeResult, FluxError> {
        let mut id_maps: BTreeMap<Author, IdMap> = BTreeMap::new();
        for (author, path) in &config.id_maps {
            if config.sources.iter().any(|source| source.spec.author == *author) {
                sink.event(ProgressEvent {
                    message: format!("phase=Resolve; identifier map for {author}"),
                    elapsed: None,
                });
                id_maps.insert(*author, IdMap::from_path(path.as_std_path())?);
            }
        }

        let mut table = FluxTable::default();
        let mut sources = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            let id_map = id_maps
                .get(&source.spec.author)
                .ok_or(FluxError::MissingIdMap(source.spec.author))?;

            sink.event(ProgressEvent {
                message: format!("phase=Load; {}", source.spec),
                elapsed: None,
            });
            let start = Instant::now();
            let loader = loader_for(source.spec.author, source.mode);
            let loaded = load_samples(
                loader.as_ref(),
                &LoadRequest {
                    experiment: source.spec.experiment,
                    selection: &source.selection,
                    catalog: &source.catalog,
                    dir: &source.dir,
                    id_map,
                },
            )?;
            sink.event(ProgressEvent {
                message: format!("phase=Load; {} rows from {}", loaded.len(), source.spec),
                elapsed: Some(start.elapsed()),
            });

            sources.push(SourceSummary {
                source: source.spec.to_string(),
                dir: source.dir.to_string(),
                samples: loaded
                    .samples(source.spec.author)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                rows: loaded.len(),
            });
            table.extend(loaded);
        }

        info!(rows = table.len(), sources = sources.len(), "harmonized flux table");
        Ok(HarmonizeResult { table, sources })
    }

    /// Writes the table and its provenance sidecar.
    pub fn write(
        &self,
        result: &HarmonizeResult,
        output: &Utf8Path,
        format: OutputFormat,
        sink: &dyn ProgressSink,
    ) -> Result<(), FluxError> {
        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {output}"),
            elapsed: None,
        });
        Store::write_bytes_atomic(output, &format.render(&result.table)?)?;
        let metadata = Metadata {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            format: format.as_str().to_string(),
            rows: result.table.len(),
            sources: result
                .sources
                .iter()
                .map(|source| SourceMetadata {
                    source: source.source.clone(),
                    dir: source.dir.clone(),
                    samples: source.samples.clone(),
                    rows: source.rows,
                })
                .collect(),
        };
        Store::write_metadata(&Store::metadata_path(output), &metadata)
    }

    pub fn catalog(&self, author: Author, experiment: Experiment) -> Result<CatalogResult, FluxError> {
        let catalog = SampleCatalog::builtin(author, experiment)?;
        Ok(CatalogResult {
            author: author.to_string(),
            experiment: experiment.to_string(),
            entries: catalog
                .entries()
                .map(|(sample, file)| CatalogEntry {
                    sample: sample.to_string(),
                    file: file.to_string(),
                })
                .collect(),
        })
    }

    pub fn inspect(&self, path: &Utf8Path) -> Result<(MatFile, InspectResult), FluxError> {
        let mat = MatFile::open(path.as_std_path())?;
        let result = InspectResult {
            description: mat.description().to_string(),
            variables: mat.describe(),
        };
        Ok((mat, result))
    }
}
