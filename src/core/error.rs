use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },
    #[error("configuration directory not found: {}", path.display())]
    ConfigDirNotFound { path: PathBuf },
    #[error("no json configuration files found in {}", path.display())]
    NoConfigFiles { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration {}: {source}", path.display())]
    ConfigMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration is missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("configuration does not list any course ids")]
    NoCourseIds,
    #[error("sync utility not found: {program} (try 'pip install canvassyncer')")]
    UtilityNotFound { program: String },
    #[error("invalid utility command '{command}': {message}")]
    InvalidUtility { command: String, message: String },
    #[error("failed to launch sync utility: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("run cancelled")]
    Cancelled,
    #[error("failed to write temporary configuration: {0}")]
    TempConfig(#[source] std::io::Error),
    #[error("cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
