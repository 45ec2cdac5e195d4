use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a dataset or ranking its configurations.
///
/// Every variant that points at input data carries the origin (a file path or a
/// trace label) and a 1-based line number.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: {reason}")]
    MalformedInput {
        origin: String,
        line: usize,
        reason: String,
    },

    #[error("{origin}:{line}: field {field} '{text}' is not a valid {expected}")]
    Parse {
        origin: String,
        line: usize,
        field: usize,
        text: String,
        expected: &'static str,
    },

    #[error("no runs have parameter {param_index} equal to {value}")]
    EmptyBucket { param_index: usize, value: u32 },

    #[error("parameter index {param_index} out of range for {num_params} parameters")]
    ParameterIndex {
        param_index: usize,
        num_params: usize,
    },

    #[error("dataset has no traces")]
    EmptyDataset,

    #[error("dataset shape mismatch: {0}")]
    Shape(String),

    #[error(
        "run {run} of trace '{trace}' has configuration [{found}], but trace '{reference}' has [{expected}]"
    )]
    Misaligned {
        trace: String,
        reference: String,
        run: usize,
        found: String,
        expected: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, RankError>;

/// Errors raised while reading a study configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
