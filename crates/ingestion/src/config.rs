//! Acquisition configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::BridgeConfig;

/// Acquisition loop timing
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Sleep between successful polls
    pub poll_period: Duration,

    /// Sleep after a failed connect or poll
    pub reconnect_backoff: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(2),
            reconnect_backoff: Duration::from_millis(20),
        }
    }
}

impl AcquisitionConfig {
    /// Create new acquisition configuration
    pub fn new(poll_period: Duration, reconnect_backoff: Duration) -> Self {
        Self {
            poll_period,
            reconnect_backoff,
        }
    }
}

impl From<&BridgeConfig> for AcquisitionConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self::new(config.poll_period(), config.reconnect_backoff())
    }
}

/// Acquisition metrics
///
/// Shared between the acquisition thread and whoever reports progress.
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
    /// Polls issued on a connected handle
    pub polls: AtomicU64,

    /// Failed connects and failed polls
    pub failures: AtomicU64,

    /// Successful connects
    pub connects: AtomicU64,

    /// Poses written into the cache
    pub poses_written: AtomicU64,
}

impl AcquisitionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful connect, returning the total so far
    pub fn record_connect(&self) -> u64 {
        self.connects.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_written(&self) {
        self.poses_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> AcquisitionStats {
        let connects = self.connects.load(Ordering::Relaxed);
        AcquisitionStats {
            polls: self.polls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            connects,
            reconnects: connects.saturating_sub(1),
            poses_written: self.poses_written.load(Ordering::Relaxed),
        }
    }
}

/// Acquisition summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Polls issued on a connected handle
    pub polls: u64,

    /// Failed connects and failed polls
    pub failures: u64,

    /// Successful connects
    pub connects: u64,

    /// Connects after the first one
    pub reconnects: u64,

    /// Poses written into the cache
    pub poses_written: u64,
}
