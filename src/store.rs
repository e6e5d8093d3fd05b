use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::FluxError;

/// Provenance written next to every harmonized table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub format: String,
    pub rows: usize,
    pub sources: Vec<SourceMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source: String,
    pub dir: String,
    pub samples: Vec<String>,
    pub rows: usize,
}

pub struct Store;

impl Store {
    pub fn metadata_path(output: &Utf8Path) -> Utf8PathBuf {
        let file_name = output.file_name().unwrap_or("output");
        output.with_file_name(format!("{file_name}.meta.json"))
    }

    pub fn write_metadata(path: &Utf8Path, metadata: &Metadata) -> Result<(), FluxError> {
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| FluxError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(path, &content)
    }

    pub fn read_metadata(path: &Utf8Path) -> Result<Metadata, FluxError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| FluxError::Filesystem(format!("read {path}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| FluxError::Filesystem(err.to_string()))
    }

    /// Writes through a temporary file in the destination directory so readers never
    /// observe a half-written table.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), FluxError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| FluxError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".flux-harmonizer")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| FluxError::Filesystem(err.to_string()))?;
        std::io::Write::write_all(&mut temp, content)
            .map_err(|err| FluxError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| FluxError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
