//! Error types for uptrace-monitor.

use thiserror::Error;

/// Errors raised by the CLI itself, outside the reconciler.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid plan {path}: {message}")]
    Plan { path: String, message: String },

    #[error("State store error: {0}")]
    State(String),

    #[error("No state for address '{0}'")]
    UnknownAddress(String),

    #[error("Address '{0}' is already managed")]
    AddressTaken(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
