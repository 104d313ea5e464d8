//! Simulator error types

use std::net::SocketAddr;

use contracts::ContractError;
use thiserror::Error;
use tracking::TrackingError;

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Unusable configuration
    #[error("invalid simulator configuration: {0}")]
    Config(#[from] ContractError),

    /// Transport could not be bound
    #[error("failed to bind transport on {address}: {message}")]
    Bind { address: SocketAddr, message: String },

    /// Transport failed while running
    #[error("transport error: {0}")]
    Transport(#[from] TrackingError),
}

impl SimulatorError {
    pub fn bind(address: SocketAddr, message: impl Into<String>) -> Self {
        Self::Bind {
            address,
            message: message.into(),
        }
    }
}
