//! Bridge orchestrator - wires acquisition, cache and publisher together.
//!
//! The two loops run on dedicated OS threads and share nothing but the
//! pose cache and the cancellation token. Tokio is only used to wait for
//! the shutdown signal and to join the threads without blocking the
//! runtime.

use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{BridgeConfig, CancellationToken, PoseSink, PoseSourceConnector};
use dispatcher::{FixedRatePublisher, PublisherConfig};
use ingestion::{AcquisitionConfig, AcquisitionLoop, PoseCache};
use tracing::{info, warn};

use super::BridgeStats;
use crate::error::CliError;

/// Bridge orchestrator
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    /// Create a bridge from a validated configuration
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Run both loops until `shutdown` resolves or the sink fails
    ///
    /// A sink failure cancels the acquisition loop and is returned as an
    /// error once both threads have stopped.
    pub async fn run<C, S, F>(self, connector: C, sink: S, shutdown: F) -> Result<BridgeStats>
    where
        C: PoseSourceConnector + 'static,
        S: PoseSink + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let cache = Arc::new(PoseCache::new());
        let cancel = CancellationToken::new();

        let acquisition = AcquisitionLoop::new(
            connector,
            self.config.tracker_address(),
            cache.clone(),
            AcquisitionConfig::from(&self.config),
        );
        let publisher = FixedRatePublisher::new(sink, PublisherConfig::from(&self.config));

        info!(
            tracker = %self.config.tracker_address(),
            rate_hz = self.config.rate_hz,
            republish = ?self.config.republish,
            "Starting bridge loops"
        );

        let acquisition_thread = {
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("acquisition".to_string())
                .spawn(move || acquisition.run(&cancel))
                .map_err(|e| CliError::startup(format!("failed to spawn acquisition thread: {e}")))?
        };

        let publisher_thread = {
            let cancel = cancel.clone();
            let cache = cache.clone();
            let worker_cancel = cancel.clone();
            let spawned = thread::Builder::new()
                .name("publisher".to_string())
                .spawn(move || {
                    let result = publisher.run(&cache, &worker_cancel);
                    if result.is_err() {
                        worker_cancel.cancel();
                    }
                    result
                });
            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    cancel.cancel();
                    let _ = acquisition_thread.join();
                    return Err(
                        CliError::startup(format!("failed to spawn publisher thread: {e}")).into(),
                    );
                }
            }
        };

        let mut publisher_done = tokio::task::spawn_blocking(move || publisher_thread.join());
        let publisher_joined = tokio::select! {
            _ = shutdown => {
                warn!("Received shutdown signal, stopping bridge...");
                cancel.cancel();
                (&mut publisher_done).await
            }
            joined = &mut publisher_done => joined,
        };

        cancel.cancel();
        let acquisition_joined = tokio::task::spawn_blocking(move || acquisition_thread.join())
            .await
            .context("acquisition join task failed")?;

        let acquisition = acquisition_joined.map_err(|_| CliError::WorkerPanicked {
            name: "acquisition",
        })?;
        let publisher = publisher_joined
            .context("publisher join task failed")?
            .map_err(|_| CliError::WorkerPanicked { name: "publisher" })?
            .context("Publisher loop failed")?;

        let stats = BridgeStats {
            acquisition,
            publisher,
            duration: start_time.elapsed(),
        };

        info!(
            published = stats.publisher.published,
            reconnects = stats.acquisition.reconnects,
            duration_secs = stats.duration.as_secs_f64(),
            rate_hz = format!("{:.2}", stats.publish_rate()),
            "Bridge shutdown complete"
        );

        Ok(stats)
    }
}
