use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::{Author, Experiment};

#[derive(Debug, Error, Diagnostic)]
pub enum FluxError {
    #[error("unknown model author: {0}")]
    InvalidAuthor(String),

    #[error("unknown experiment: {0}")]
    InvalidExperiment(String),

    #[error("invalid source specifier: {0} (expected author:experiment)")]
    InvalidSource(String),

    #[error("invalid Kurata sampling mode: {0}")]
    InvalidMode(String),

    #[error("{author} has no {experiment} simulation files")]
    UnsupportedExperiment {
        author: Author,
        experiment: Experiment,
    },

    #[error("Unable to find relevant data for {0}")]
    #[diagnostic(help("run `flux-harmonizer catalog` to list the known samples"))]
    UnknownSamples(String),

    #[error("missing config file flux-harmonizer.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no identifier map configured for {0}")]
    MissingIdMap(Author),

    #[error("identifier map {path}: {message}")]
    IdMap { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read CSV {path}: {message}")]
    Csv { path: String, message: String },

    #[error("not a MAT file: {0}")]
    NotMatFile(String),

    #[error("unsupported MAT file version: {0}")]
    UnsupportedMatVersion(String),

    #[error("malformed MAT data: {0}")]
    MalformedMat(String),

    #[error("unsupported MAT array class: {0}")]
    UnsupportedMatClass(String),

    #[error("variable {name} not found in {path}")]
    MissingVariable { path: String, name: String },

    #[error("variable {name} has unexpected shape {shape:?}: {message}")]
    UnexpectedShape {
        name: String,
        shape: Vec<usize>,
        message: String,
    },

    #[error("{author} sample {sample}: reaction {id} not present")]
    MissingReaction {
        author: Author,
        sample: String,
        id: String,
    },

    #[error("{author} sample {sample}: glucose uptake is {uptake}, cannot normalize")]
    DegenerateUptake {
        author: Author,
        sample: String,
        uptake: f64,
    },
}

impl FluxError {
    /// Process exit status: 2 for usage and configuration problems, 3 for unreadable
    /// or undecodable inputs, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            FluxError::UnknownSamples(_)
            | FluxError::MissingConfig
            | FluxError::ConfigRead(_)
            | FluxError::ConfigParse(_)
            | FluxError::MissingIdMap(_)
            | FluxError::UnsupportedExperiment { .. } => 2,
            FluxError::Filesystem(_)
            | FluxError::Csv { .. }
            | FluxError::IdMap { .. }
            | FluxError::NotMatFile(_)
            | FluxError::UnsupportedMatVersion(_)
            | FluxError::MalformedMat(_)
            | FluxError::UnsupportedMatClass(_)
            | FluxError::MissingVariable { .. }
            | FluxError::UnexpectedShape { .. } => 3,
            FluxError::InvalidAuthor(_)
            | FluxError::InvalidExperiment(_)
            | FluxError::InvalidSource(_)
            | FluxError::InvalidMode(_)
            | FluxError::MissingReaction { .. }
            | FluxError::DegenerateUptake { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_problems_exit_with_two() {
        assert_eq!(FluxError::MissingConfig.exit_code(), 2);
        assert_eq!(
            FluxError::ConfigRead(PathBuf::from("does-not-exist.json")).exit_code(),
            2
        );
        assert_eq!(FluxError::ConfigParse("eof".to_string()).exit_code(), 2);
        assert_eq!(FluxError::UnknownSamples("tpi".to_string()).exit_code(), 2);
    }

    #[test]
    fn decode_failures_exit_with_three() {
        let missing = FluxError::MissingVariable {
            path: "result_cont_WT.mat".to_string(),
            name: "Vnet".to_string(),
        };
        let shape = FluxError::UnexpectedShape {
            name: "FLUX".to_string(),
            shape: vec![3],
            message: "needs a time x reaction matrix".to_string(),
        };
        assert_eq!(missing.exit_code(), 3);
        assert_eq!(shape.exit_code(), 3);
        assert_eq!(FluxError::MalformedMat("truncated".to_string()).exit_code(), 3);
    }

    #[test]
    fn model_errors_exit_with_one() {
        let err = FluxError::MissingReaction {
            author: Author::Millard,
            sample: "WT".to_string(),
            id: "XCH_GLC".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
