//! Fixed-rate publisher loop: pose cache -> sink

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use contracts::{BridgeConfig, CancellationToken, Pose, PoseSink, RepublishPolicy};
use ingestion::PoseCache;
use observability::{metrics, RunningStats};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::metrics::{PublisherMetrics, PublisherStats};
use crate::schedule::PublishSchedule;

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Publish interval `1 / rate`
    pub period: Duration,
    /// Which cached poses get forwarded
    pub republish: RepublishPolicy,
    /// Extra attempts after a failed transmit
    pub sink_retries: u32,
    /// Upper bound on a single sleep, so cancellation stays responsive
    pub max_sleep: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20),
            republish: RepublishPolicy::OnWrite,
            sink_retries: 0,
            max_sleep: Duration::from_millis(2),
        }
    }
}

impl From<&BridgeConfig> for PublisherConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            period: config.publish_period(),
            republish: config.republish,
            sink_retries: config.sink_retries,
            max_sleep: config.poll_period(),
        }
    }
}

/// What a due tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Published,
    /// Cache never written
    SkippedEmpty,
    /// Nothing written since the last forwarded pose
    SkippedUnchanged,
}

/// Emits at most one cached pose per interval
pub struct FixedRatePublisher<S: PoseSink> {
    sink: S,
    config: PublisherConfig,
    metrics: Arc<PublisherMetrics>,
    last_forwarded_seq: Option<u64>,
    lateness: RunningStats,
}

impl<S: PoseSink> FixedRatePublisher<S> {
    pub fn new(sink: S, config: PublisherConfig) -> Self {
        Self {
            sink,
            config,
            metrics: Arc::new(PublisherMetrics::new()),
            last_forwarded_seq: None,
            lateness: RunningStats::default(),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<PublisherMetrics> {
        self.metrics.clone()
    }

    /// Run until cancelled or until the sink fails for good
    ///
    /// The sink is closed on both paths.
    #[instrument(
        name = "publisher_run",
        skip(self, cache, cancel),
        fields(sink = %self.sink.name(), period_ms = self.config.period.as_secs_f64() * 1000.0)
    )]
    pub fn run(
        mut self,
        cache: &PoseCache,
        cancel: &CancellationToken,
    ) -> Result<PublisherStats, DispatcherError> {
        info!(republish = ?self.config.republish, "publisher loop started");

        let mut schedule = PublishSchedule::new(self.config.period, Instant::now());
        let result = self.drive(&mut schedule, cache, cancel);

        if let Err(e) = self.sink.close() {
            warn!(error = %e, "sink close failed");
        }

        let stats = self.metrics.snapshot();
        match &result {
            Ok(()) => info!(
                ticks = stats.ticks,
                published = stats.published,
                skipped_empty = stats.skipped_empty,
                skipped_unchanged = stats.skipped_unchanged,
                missed_intervals = stats.missed_intervals,
                lateness_ms = %self.lateness.summary(),
                "publisher loop stopped"
            ),
            Err(e) => warn!(error = %e, published = stats.published, "publisher loop failed"),
        }
        result.map(|()| stats)
    }

    fn drive(
        &mut self,
        schedule: &mut PublishSchedule,
        cache: &PoseCache,
        cancel: &CancellationToken,
    ) -> Result<(), DispatcherError> {
        while !cancel.is_cancelled() {
            let now = Instant::now();
            let deadline = schedule.next_deadline();
            if let Some(steps) = schedule.poll(now) {
                let lateness_ms = now.duration_since(deadline).as_secs_f64() * 1000.0;
                self.record_due(steps, lateness_ms);
                self.tick(cache)?;
            }

            let wait = schedule
                .time_until_deadline(Instant::now())
                .min(self.config.max_sleep);
            if !wait.is_zero() {
                thread::sleep(wait);
            }
        }
        Ok(())
    }

    fn record_due(&mut self, steps: u64, lateness_ms: f64) {
        let missed = steps.saturating_sub(1);
        self.metrics.inc_ticks();
        self.metrics.add_missed_intervals(missed);
        self.lateness.push(lateness_ms);
        metrics::record_publish_tick(missed, lateness_ms);
        if missed > 0 {
            debug!(missed, "publisher stalled, skipping ahead");
        }
    }

    /// Handle one due tick: read the cache and forward per the policy
    pub fn tick(&mut self, cache: &PoseCache) -> Result<TickOutcome, DispatcherError> {
        let Some(cached) = cache.snapshot() else {
            self.metrics.inc_skipped_empty();
            metrics::record_tick_skipped("empty");
            trace!("cache empty, tick skipped");
            return Ok(TickOutcome::SkippedEmpty);
        };

        if self.config.republish == RepublishPolicy::OnWrite
            && self.last_forwarded_seq == Some(cached.seq)
        {
            self.metrics.inc_skipped_unchanged();
            metrics::record_tick_skipped("unchanged");
            return Ok(TickOutcome::SkippedUnchanged);
        }

        self.forward(&cached.pose)?;
        self.last_forwarded_seq = Some(cached.seq);
        self.metrics.inc_published();
        metrics::record_pose_published(self.sink.name());
        Ok(TickOutcome::Published)
    }

    fn forward(&mut self, pose: &Pose) -> Result<(), DispatcherError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.sink.transmit(pose) {
                Ok(()) => return Ok(()),
                Err(e) if attempt <= self.config.sink_retries => {
                    self.metrics.inc_retries();
                    metrics::record_sink_retry(self.sink.name());
                    warn!(error = %e, attempt, "transmit failed, retrying");
                }
                Err(e) => return Err(DispatcherError::sink_failed(self.sink.name(), attempt, e)),
            }
        }
    }
}
