use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error, cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error, cannot parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration error, unknown table distribution: {0}")]
    UnknownTableDistribution(String),

    #[error("Configuration error, invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Request error, invalid service time: {0}")]
    InvalidServiceTime(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Transition error, no pending exit in the network")]
    NoExitFound,

    #[error("Transition error, request addressed to unknown table {0}")]
    UnknownTable(usize),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report error, cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report error, serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
