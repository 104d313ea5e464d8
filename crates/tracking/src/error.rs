//! Tracking error types

use thiserror::Error;

/// Tracking protocol and transport errors
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Datagram could not be decoded
    #[error("malformed datagram: {message}")]
    Malformed { message: String },

    /// Datagram uses a protocol version we do not speak
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u8 },

    /// Tracker name does not fit the wire format
    #[error("tracker name '{name}' is {len} bytes, limit is 255")]
    NameTooLong { name: String, len: usize },

    /// Socket failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackingError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<TrackingError> for contracts::ContractError {
    fn from(e: TrackingError) -> Self {
        match e {
            TrackingError::Io(io) => Self::Io(io),
            other => Self::codec(other.to_string()),
        }
    }
}
