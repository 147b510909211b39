//! Error types for derbyctl

use derby_errors::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("Unknown track command: {0}")]
    TrackCommand(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidConfiguration(_) | CliError::YamlError(_) | CliError::JsonError(_) => 4,
            CliError::TrackCommand(_) => 2,
            CliError::IoError(_) => 1,
        }
    }
}
