//! PoseSink trait - outbound telemetry interface
//!
//! Sinks are driven synchronously by the publisher thread, which owns them
//! exclusively.

use crate::{ContractError, Pose};

/// Outbound pose transport
pub trait PoseSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Encode and transmit one pose
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError>;

    /// Release the underlying transport
    fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl<S: PoseSink + ?Sized> PoseSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError> {
        (**self).transmit(pose)
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
