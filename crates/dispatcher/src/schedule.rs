//! Drift-corrected publish schedule
//!
//! Deadlines advance in whole periods from the start instant, never from the
//! time a tick actually ran, so lateness does not accumulate.

use std::time::{Duration, Instant};

/// Fixed-interval deadline tracker
#[derive(Debug, Clone)]
pub struct PublishSchedule {
    period: Duration,
    next_deadline: Instant,
}

impl PublishSchedule {
    /// First deadline is `now + period`
    pub fn new(period: Duration, now: Instant) -> Self {
        let period = period.max(Duration::from_nanos(1));
        Self {
            period,
            next_deadline: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Check the deadline at `now`
    ///
    /// Returns `None` before the deadline. Otherwise advances the deadline
    /// past `now` and returns how many periods it moved; a stall spanning
    /// several intervals still yields a single due tick.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if now < self.next_deadline {
            return None;
        }
        let behind = now.duration_since(self.next_deadline);
        let whole = behind.as_nanos() / self.period.as_nanos();
        let steps = u64::try_from(whole).unwrap_or(u64::MAX).saturating_add(1);
        self.advance(steps);
        Some(steps)
    }

    /// Time left until the deadline (zero if already due)
    pub fn time_until_deadline(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    fn advance(&mut self, steps: u64) {
        let mut remaining = steps;
        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            self.next_deadline += self.period * chunk;
            remaining -= u64::from(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(20);

    #[test]
    fn test_not_due_before_first_deadline() {
        let start = Instant::now();
        let mut schedule = PublishSchedule::new(T, start);
        assert_eq!(schedule.next_deadline(), start + T);
        assert_eq!(schedule.poll(start), None);
        assert_eq!(schedule.poll(start + T - Duration::from_micros(1)), None);
        assert_eq!(schedule.time_until_deadline(start), T);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let start = Instant::now();
        let mut schedule = PublishSchedule::new(T, start);

        assert_eq!(schedule.poll(start + T), Some(1));
        assert_eq!(schedule.poll(start + T), None);
        assert_eq!(schedule.next_deadline(), start + 2 * T);

        // Slightly late tick does not shift later deadlines
        assert_eq!(schedule.poll(start + 2 * T + Duration::from_millis(3)), Some(1));
        assert_eq!(schedule.next_deadline(), start + 3 * T);
    }

    #[test]
    fn test_stall_advances_k_intervals_with_one_tick() {
        for k in 1..=7u32 {
            let start = Instant::now();
            let mut schedule = PublishSchedule::new(T, start);
            assert_eq!(schedule.poll(start + T), Some(1));

            let before = schedule.next_deadline();
            // Stall of k intervals measured from the pending deadline
            let woke = before + T * (k - 1) + Duration::from_millis(1);
            assert_eq!(schedule.poll(woke), Some(u64::from(k)));
            assert_eq!(schedule.next_deadline(), before + T * k);
            assert_eq!(schedule.poll(woke), None);
        }
    }

    #[test]
    fn test_deadline_exactly_on_boundary() {
        let start = Instant::now();
        let mut schedule = PublishSchedule::new(T, start);
        assert_eq!(schedule.poll(start + 3 * T), Some(3));
        assert_eq!(schedule.next_deadline(), start + 4 * T);
    }
}
