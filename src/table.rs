use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::domain::Author;
use crate::error::FluxError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxRecord {
    #[serde(serialize_with = "author_name")]
    pub author: Author,
    pub sample_id: String,
    pub condition: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "BiGG_ID")]
    pub bigg_id: Option<String>,
    pub flux: f64,
    pub normalized_flux: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    #[serde(serialize_with = "author_name")]
    pub author: Author,
    pub sample_id: String,
    pub rows: usize,
    pub mapped: usize,
}

fn author_name<S: serde::Serializer>(author: &Author, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(author.as_str())
}

/// Tidy long-format flux table: one row per (author, sample, reaction).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FluxTable {
    records: Vec<FluxRecord>,
}

impl FluxTable {
    pub fn new(records: Vec<FluxRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FluxRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: FluxRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: FluxTable) {
        self.records.extend(other.records);
    }

    pub fn first_flux(&self, id: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.flux)
    }

    pub fn first_flux_by_bigg(&self, bigg_id: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|record| record.bigg_id.as_deref() == Some(bigg_id))
            .map(|record| record.flux)
    }

    /// Every row carrying `id` takes the negated flux of the first such row.
    /// Returns `false` when no row has the id.
    pub fn negate_first(&mut self, id: &str) -> bool {
        let Some(first) = self.first_flux(id) else {
            return false;
        };
        for record in self.records.iter_mut().filter(|record| record.id == id) {
            record.flux = -first;
        }
        true
    }

    pub fn set_where_bigg(&mut self, bigg_id: &str, flux: f64) -> usize {
        let mut updated = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|record| record.bigg_id.as_deref() == Some(bigg_id))
        {
            record.flux = flux;
            updated += 1;
        }
        updated
    }

    /// Expresses every flux as a percentage of `uptake`.
    pub fn normalize_to(&mut self, uptake: f64) {
        for record in &mut self.records {
            record.normalized_flux = Some(record.flux * 100.0 / uptake);
        }
    }

    pub fn authors(&self) -> Vec<Author> {
        let mut authors: Vec<Author> = Vec::new();
        for record in &self.records {
            if !authors.contains(&record.author) {
                authors.push(record.author);
            }
        }
        authors
    }

    pub fn samples(&self, author: Author) -> Vec<&str> {
        let mut samples: Vec<&str> = Vec::new();
        for record in self.records.iter().filter(|r| r.author == author) {
            if !samples.contains(&record.sample_id.as_str()) {
                samples.push(&record.sample_id);
            }
        }
        samples
    }

    pub fn summary(&self) -> Vec<SampleSummary> {
        let mut counts: BTreeMap<(Author, String), (usize, usize)> = BTreeMap::new();
        for record in &self.records {
            let entry = counts
                .entry((record.author, record.sample_id.clone()))
                .or_default();
            entry.0 += 1;
            if record.bigg_id.is_some() {
                entry.1 += 1;
            }
        }
        counts
            .into_iter()
            .map(|((author, sample_id), (rows, mapped))| SampleSummary {
                author,
                sample_id,
                rows,
                mapped,
            })
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FluxError> {
        let csv_err = |err: csv::Error| FluxError::Csv {
            path: "<output>".to_string(),
            message: err.to_string(),
        };
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record([
                "author",
                "sample_id",
                "condition",
                "ID",
                "BiGG_ID",
                "flux",
                "normalized_flux",
            ])
            .map_err(csv_err)?;
        for record in &self.records {
            writer
                .write_record([
                    record.author.as_str().to_string(),
                    record.sample_id.clone(),
                    record.condition.clone(),
                    record.id.clone(),
                    record.bigg_id.clone().unwrap_or_default(),
                    record.flux.to_string(),
                    record
                        .normalized_flux
                        .map(|value| value.to_string())
                        .unwrap_or_default(),
                ])
                .map_err(csv_err)?;
        }
        writer
            .flush()
            .map_err(|err| FluxError::Filesystem(err.to_string()))
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, FluxError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}
