use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::FluxError;

pub const MODEL_ID_COLUMN: &str = "ID";
pub const BIGG_ID_COLUMN: &str = "BiGG ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdEntry {
    pub id: String,
    pub bigg_id: Option<String>,
}

/// Model reaction identifier to BiGG identifier table, in file order.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    entries: Vec<IdEntry>,
}

impl IdMap {
    pub fn new(entries: Vec<IdEntry>) -> Self {
        Self { entries }
    }

    pub fn from_path(path: &Path) -> Result<Self, FluxError> {
        let file = std::fs::File::open(path).map_err(|err| FluxError::IdMap {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, FluxError> {
        let id_map_err = |message: String| FluxError::IdMap {
            path: origin.to_string(),
            message,
        };
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| id_map_err(err.to_string()))?
            .clone();
        let id_idx = headers
            .iter()
            .position(|h| h.trim() == MODEL_ID_COLUMN)
            .ok_or_else(|| id_map_err(format!("missing '{MODEL_ID_COLUMN}' column")))?;
        let bigg_idx = headers
            .iter()
            .position(|h| h.trim() == BIGG_ID_COLUMN)
            .ok_or_else(|| id_map_err(format!("missing '{BIGG_ID_COLUMN}' column")))?;

        let mut entries = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|err| id_map_err(format!("row {row}: {err}")))?;
            let id = record.get(id_idx).unwrap_or_default().trim().to_string();
            let bigg_id = record
                .get(bigg_idx)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            entries.push(IdEntry { id, bigg_id });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IdEntry] {
        &self.entries
    }

    /// Keeps the first row for each model ID.
    pub fn dedup_by_id(&self) -> IdMap {
        let mut seen = HashSet::new();
        let entries = self
            .entries
            .iter()
            .filter(|entry| seen.insert(entry.id.as_str()))
            .cloned()
            .collect();
        IdMap { entries }
    }

    /// Left join on model ID: every left row yields one output per matching map row
    /// (in map order), or a single unmapped output when nothing matches.
    pub fn left_join<T: Clone>(&self, rows: &[(String, T)]) -> Vec<(String, Option<String>, T)> {
        let mut index: HashMap<&str, Vec<&IdEntry>> = HashMap::new();
        for entry in &self.entries {
            index.entry(entry.id.as_str()).or_default().push(entry);
        }

        let mut joined = Vec::with_capacity(rows.len());
        for (id, value) in rows {
            match index.get(id.as_str()) {
                Some(matches) => {
                    for entry in matches {
                        joined.push((id.clone(), entry.bigg_id.clone(), value.clone()));
                    }
                }
                None => joined.push((id.clone(), None, value.clone())),
            }
        }
        joined
    }
}
