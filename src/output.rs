use std::io::{self, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::{CatalogResult, ProgressEvent, ProgressSink};
use crate::error::FluxError;
use crate::table::FluxTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    pub fn render(&self, table: &FluxTable) -> Result<Vec<u8>, FluxError> {
        match self {
            OutputFormat::Csv => table.to_csv_bytes(),
            OutputFormat::Json => {
                let mut bytes = serde_json::to_vec_pretty(table)
                    .map_err(|err| FluxError::Filesystem(err.to_string()))?;
                bytes.push(b'\n');
                Ok(bytes)
            }
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_catalog(result: &CatalogResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress on stderr, leaving stdout free for table output.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
