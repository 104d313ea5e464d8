//! PoseSource traits - tracking source abstraction
//!
//! Splits the source contract in two: a connector that creates handles, and
//! the handle itself. The acquisition loop owns at most one handle at a time
//! and replaces it wholesale when it stops reporting liveness.

use crate::{ContractError, Pose, TrackerAddress};

/// Factory for tracking source handles
///
/// # Example
///
/// ```ignore
/// let mut connector = UdpTrackerConnector::default();
/// let mut source = connector.connect(&address)?;
/// while source.poll_once() {
///     if let Some(pose) = source.latest_pose() {
///         cache.write(pose);
///     }
/// }
/// ```
pub trait PoseSourceConnector: Send {
    /// Handle type produced by this connector
    type Source: PoseSource;

    /// Open a new connection to the tracking source
    ///
    /// # Errors
    /// Returns a connection error; callers treat it as transient.
    fn connect(&mut self, address: &TrackerAddress) -> Result<Self::Source, ContractError>;
}

/// Connected tracking source handle
pub trait PoseSource: Send {
    /// Service the connection once
    ///
    /// Returns `false` when the connection is no longer alive and must be
    /// recreated.
    fn poll_once(&mut self) -> bool;

    /// Most recent pose received on this handle, if any
    fn latest_pose(&self) -> Option<Pose>;
}
