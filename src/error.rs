use std::path::PathBuf;
use thiserror::Error;

/// Failure loading or validating data and configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Failure exporting a combat log.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize combat log: {0}")]
    Serialize(#[from] serde_json::Error),
}
