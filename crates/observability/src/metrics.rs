//! Pose relay metrics
//!
//! Thin helpers over the `metrics` facade so every crate records the same
//! names. Without an installed recorder they are no-ops.

use metrics::{counter, gauge, histogram};

// ===== Acquisition =====

/// A pose was copied from the source into the cache
pub fn record_pose_acquired() {
    counter!("pose_relay_poses_acquired_total").increment(1);
}

/// A connect attempt or poll failed
pub fn record_source_failure() {
    counter!("pose_relay_source_failures_total").increment(1);
}

/// A replacement source handle was created
pub fn record_source_reconnect() {
    counter!("pose_relay_source_reconnects_total").increment(1);
}

// ===== Publisher =====

/// A publish deadline was reached
///
/// `missed` is the number of whole intervals skipped by a stall and
/// `lateness_ms` how far past the deadline the tick ran.
pub fn record_publish_tick(missed: u64, lateness_ms: f64) {
    counter!("pose_relay_publish_ticks_total").increment(1);
    if missed > 0 {
        counter!("pose_relay_publish_missed_intervals_total").increment(missed);
    }
    histogram!("pose_relay_publish_lateness_ms").record(lateness_ms);
}

/// A pose was forwarded through a sink
pub fn record_pose_published(sink_name: &str) {
    counter!(
        "pose_relay_poses_published_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// A tick ran without forwarding (`reason`: `empty` or `unchanged`)
pub fn record_tick_skipped(reason: &'static str) {
    counter!("pose_relay_publish_skipped_total", "reason" => reason).increment(1);
}

/// A failed transmit is being retried
pub fn record_sink_retry(sink_name: &str) {
    counter!(
        "pose_relay_sink_retries_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

// ===== Simulator =====

/// One simulator tick completed
pub fn record_sim_tick(sim_time: f64, trackers: usize) {
    counter!("pose_relay_sim_ticks_total").increment(1);
    gauge!("pose_relay_sim_time_seconds").set(sim_time);
    gauge!("pose_relay_sim_trackers").set(trackers as f64);
}

/// The simulator transport went through an automatic restart
pub fn record_sim_restart() {
    counter!("pose_relay_sim_restarts_total").increment(1);
}

/// Current number of subscriptions held by the simulator transport
pub fn record_sim_subscribers(count: usize) {
    gauge!("pose_relay_sim_subscribers").set(count as f64);
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
