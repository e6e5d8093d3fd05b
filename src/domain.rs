use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FluxError;

static EXPRESSION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*)\((\d+(?:\.\d+)?)\)$").expect("valid expression-label regex")
});
static DELETION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^d([a-z][A-Za-z0-9]*)$").expect("valid deletion-label regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Khodayari,
    Kurata,
    Millard,
    Kotte,
    Chassagnole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Mat,
    Csv,
}

impl Author {
    pub const ALL: [Author; 5] = [
        Author::Khodayari,
        Author::Kurata,
        Author::Millard,
        Author::Kotte,
        Author::Chassagnole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Author::Khodayari => "Khodayari",
            Author::Kurata => "Kurata",
            Author::Millard => "Millard",
            Author::Kotte => "Kotte",
            Author::Chassagnole => "Chassagnole",
        }
    }

    /// Directory name used by the default data layout.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Author::Khodayari => "khodayari",
            Author::Kurata => "kurata",
            Author::Millard => "millard",
            Author::Kotte => "kotte",
            Author::Chassagnole => "chassagnole",
        }
    }

    pub fn file_format(&self) -> FileFormat {
        match self {
            Author::Khodayari | Author::Kurata => FileFormat::Mat,
            Author::Millard | Author::Kotte | Author::Chassagnole => FileFormat::Csv,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Author {
    type Err = FluxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Author::ALL
            .into_iter()
            .find(|author| author.dir_name() == normalized)
            .ok_or_else(|| FluxError::InvalidAuthor(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Experiment {
    Knockouts,
    BatchKnockouts,
    Zwf,
    Pgi,
    Eno,
    Dilution,
}

impl Experiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Experiment::Knockouts => "knockouts",
            Experiment::BatchKnockouts => "batch-knockouts",
            Experiment::Zwf => "zwf",
            Experiment::Pgi => "pgi",
            Experiment::Eno => "eno",
            Experiment::Dilution => "dilution",
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Experiment {
    type Err = FluxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "knockouts" | "ko" => Ok(Experiment::Knockouts),
            "batch-knockouts" | "batch" => Ok(Experiment::BatchKnockouts),
            "zwf" => Ok(Experiment::Zwf),
            "pgi" => Ok(Experiment::Pgi),
            "eno" => Ok(Experiment::Eno),
            "dilution" | "dilutions" => Ok(Experiment::Dilution),
            _ => Err(FluxError::InvalidExperiment(value.to_string())),
        }
    }
}

/// Which time point of a Kurata `FLUX` matrix is taken as the steady state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KurataMode {
    Continuous,
    Batch,
}

impl KurataMode {
    const CONTINUOUS_ROW: usize = 2100;
    const BATCH_OFFSET: usize = 101;
    const BATCH_ROWS_PER_HOUR: usize = 10;
    const BATCH_SAMPLING_HOURS: usize = 5;

    pub fn for_experiment(experiment: Experiment) -> Self {
        match experiment {
            Experiment::BatchKnockouts => KurataMode::Batch,
            _ => KurataMode::Continuous,
        }
    }

    pub fn flux_row(&self) -> usize {
        match self {
            KurataMode::Continuous => Self::CONTINUOUS_ROW,
            KurataMode::Batch => {
                Self::BATCH_OFFSET + Self::BATCH_ROWS_PER_HOUR * Self::BATCH_SAMPLING_HOURS
            }
        }
    }
}

impl fmt::Display for KurataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KurataMode::Continuous => write!(f, "continuous"),
            KurataMode::Batch => write!(f, "batch"),
        }
    }
}

impl FromStr for KurataMode {
    type Err = FluxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "continuous" => Ok(KurataMode::Continuous),
            "batch" => Ok(KurataMode::Batch),
            _ => Err(FluxError::InvalidMode(value.to_string())),
        }
    }
}

/// An `author:experiment` pair naming one family of simulation files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpec {
    pub author: Author,
    pub experiment: Experiment,
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.author.dir_name(), self.experiment)
    }
}

impl FromStr for SourceSpec {
    type Err = FluxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (author, experiment) = trimmed
            .split_once(':')
            .ok_or_else(|| FluxError::InvalidSource(value.to_string()))?;
        Ok(Self {
            author: author.parse()?,
            experiment: experiment.parse()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SampleSelection {
    #[default]
    All,
    Named(Vec<String>),
}

impl SampleSelection {
    /// A request of exactly `["all"]` selects every sample; anything else is taken literally.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() == 1 && names[0] == "all" {
            SampleSelection::All
        } else {
            SampleSelection::Named(names)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleCondition {
    WildType,
    Knockout { gene: String },
    Expression { gene: String, percent: f64 },
    Dilution { rate: f64 },
    Other(String),
}

impl SampleCondition {
    pub fn classify(experiment: Experiment, label: &str) -> Self {
        if label == "WT" {
            return SampleCondition::WildType;
        }
        match experiment {
            Experiment::Knockouts | Experiment::BatchKnockouts => SampleCondition::Knockout {
                gene: label.to_string(),
            },
            Experiment::Zwf | Experiment::Pgi | Experiment::Eno => {
                if let Some(caps) = EXPRESSION_LABEL.captures(label) {
                    if let Ok(percent) = caps[2].parse::<f64>() {
                        return SampleCondition::Expression {
                            gene: caps[1].to_string(),
                            percent,
                        };
                    }
                }
                if let Some(caps) = DELETION_LABEL.captures(label) {
                    return SampleCondition::Knockout {
                        gene: caps[1].to_string(),
                    };
                }
                SampleCondition::Other(label.to_string())
            }
            Experiment::Dilution => match label.parse::<f64>() {
                Ok(rate) => SampleCondition::Dilution { rate },
                Err(_) => SampleCondition::Other(label.to_string()),
            },
        }
    }
}

impl fmt::Display for SampleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleCondition::WildType => write!(f, "wild-type"),
            SampleCondition::Knockout { gene } => write!(f, "knockout:{gene}"),
            SampleCondition::Expression { gene, percent } => {
                write!(f, "expression:{gene}@{percent}")
            }
            SampleCondition::Dilution { rate } => write!(f, "dilution:{rate}"),
            SampleCondition::Other(label) => write!(f, "{label}"),
        }
    }
}
