//! Acquisition loop: tracking source -> pose cache

use std::sync::Arc;

use contracts::{CancellationToken, PoseSource, PoseSourceConnector, TrackerAddress};
use observability::metrics;
use tracing::{debug, info, instrument, warn};

use crate::cache::PoseCache;
use crate::config::{AcquisitionConfig, AcquisitionMetrics, AcquisitionStats};

/// Result of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A pose was written into the cache
    Wrote,
    /// Source alive but no pose available yet
    NoPose,
    /// Connect or poll failed; handle released
    Failed,
}

/// Keeps the pose cache fed from a possibly unreliable source
///
/// Owns at most one source handle. A handle that stops reporting liveness is
/// dropped before the next connect attempt creates its replacement.
pub struct AcquisitionLoop<C: PoseSourceConnector> {
    connector: C,
    address: TrackerAddress,
    cache: Arc<PoseCache>,
    config: AcquisitionConfig,
    metrics: Arc<AcquisitionMetrics>,
    source: Option<C::Source>,
}

impl<C: PoseSourceConnector> AcquisitionLoop<C> {
    pub fn new(
        connector: C,
        address: TrackerAddress,
        cache: Arc<PoseCache>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            connector,
            address,
            cache,
            config,
            metrics: Arc::new(AcquisitionMetrics::new()),
            source: None,
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<AcquisitionMetrics> {
        self.metrics.clone()
    }

    /// Whether a source handle is currently held
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Run until cancelled
    ///
    /// Source failures never end the loop; they are retried after the
    /// back-off interval.
    #[instrument(name = "acquisition_run", skip(self, cancel), fields(tracker = %self.address))]
    pub fn run(mut self, cancel: &CancellationToken) -> AcquisitionStats {
        info!(
            poll_ms = self.config.poll_period.as_millis() as u64,
            backoff_ms = self.config.reconnect_backoff.as_millis() as u64,
            "acquisition loop started"
        );

        while !cancel.is_cancelled() {
            let pause = match self.step() {
                StepOutcome::Failed => self.config.reconnect_backoff,
                StepOutcome::Wrote | StepOutcome::NoPose => self.config.poll_period,
            };
            if cancel.sleep(pause) {
                break;
            }
        }

        self.source = None;
        let stats = self.metrics.snapshot();
        info!(
            polls = stats.polls,
            failures = stats.failures,
            reconnects = stats.reconnects,
            poses_written = stats.poses_written,
            "acquisition loop stopped"
        );
        stats
    }

    /// One iteration: connect if needed, poll, copy the latest pose
    pub fn step(&mut self) -> StepOutcome {
        if self.source.is_none() {
            match self.connector.connect(&self.address) {
                Ok(source) => {
                    if self.metrics.record_connect() > 1 {
                        metrics::record_source_reconnect();
                    }
                    debug!(tracker = %self.address, "source connected");
                    self.source = Some(source);
                }
                Err(e) => {
                    self.metrics.record_failure();
                    metrics::record_source_failure();
                    debug!(error = %e, "source connect failed");
                    return StepOutcome::Failed;
                }
            }
        }

        let Some(source) = self.source.as_mut() else {
            return StepOutcome::Failed;
        };

        self.metrics.record_poll();
        if !source.poll_once() {
            // Release before the next iteration creates a replacement
            self.source = None;
            self.metrics.record_failure();
            metrics::record_source_failure();
            warn!(tracker = %self.address, "source connection lost, reconnecting");
            return StepOutcome::Failed;
        }

        match source.latest_pose() {
            Some(pose) => {
                self.cache.write(pose);
                self.metrics.record_written();
                metrics::record_pose_acquired();
                StepOutcome::Wrote
            }
            None => StepOutcome::NoPose,
        }
    }
}
