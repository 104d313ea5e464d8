//! Publisher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the publisher thread and progress reporters
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Deadlines reached
    ticks: AtomicU64,
    /// Poses forwarded
    published: AtomicU64,
    /// Ticks with an empty cache
    skipped_empty: AtomicU64,
    /// Ticks with nothing written since the last forward
    skipped_unchanged: AtomicU64,
    /// Whole intervals swallowed by stalls
    missed_intervals: AtomicU64,
    /// Transmit retries
    retries: AtomicU64,
}

impl PublisherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped_empty(&self) {
        self.skipped_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped_unchanged(&self) {
        self.skipped_unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_missed_intervals(&self, count: u64) {
        self.missed_intervals.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            skipped_empty: self.skipped_empty.load(Ordering::Relaxed),
            skipped_unchanged: self.skipped_unchanged.load(Ordering::Relaxed),
            missed_intervals: self.missed_intervals.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of publisher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub ticks: u64,
    pub published: u64,
    pub skipped_empty: u64,
    pub skipped_unchanged: u64,
    pub missed_intervals: u64,
    pub retries: u64,
}
