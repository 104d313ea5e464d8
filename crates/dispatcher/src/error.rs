//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink kept failing after the retry budget was spent
    #[error("sink '{sink_name}' failed after {attempts} attempt(s): {source}")]
    SinkFailed {
        sink_name: String,
        attempts: u32,
        #[source]
        source: contracts::ContractError,
    },

    /// Error from contract
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a fatal sink failure
    pub fn sink_failed(
        sink_name: impl Into<String>,
        attempts: u32,
        source: contracts::ContractError,
    ) -> Self {
        Self::SinkFailed {
            sink_name: sink_name.into(),
            attempts,
            source,
        }
    }
}
