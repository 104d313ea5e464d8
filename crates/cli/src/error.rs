//! Error types for CLI operations.

use std::path::Path;

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be parsed or is invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// A component could not be started
    #[error("Startup failed: {message}")]
    Startup { message: String },

    /// A worker thread died instead of returning
    #[error("Worker '{name}' panicked")]
    WorkerPanicked { name: &'static str },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }
}
