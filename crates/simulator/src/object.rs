//! Per-object simulator state

use contracts::TrajectoryParams;
use tracking::TrackerReport;

use crate::trajectory::{sample, TrajectorySample};

/// One simulated tracker
///
/// The last sample only feeds status output.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    index: usize,
    name: String,
    last_sample: Option<TrajectorySample>,
}

impl TrackedObject {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            name: format!("uav{index}"),
            last_sample: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_sample(&self) -> Option<&TrajectorySample> {
        self.last_sample.as_ref()
    }

    /// Evaluate the trajectory at `sim_time` and build the outgoing report
    ///
    /// `timestamp` is the wall-clock stamp carried on the wire.
    pub fn advance(&mut self, params: &TrajectoryParams, sim_time: f64, timestamp: f64) -> TrackerReport {
        let s = sample(params, self.index, sim_time);
        self.last_sample = Some(s);
        TrackerReport {
            name: self.name.clone(),
            timestamp,
            position: s.position,
            orientation: s.orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_first_sample() {
        let mut object = TrackedObject::new(3);
        assert_eq!(object.name(), "uav3");
        assert!(object.last_sample().is_none());

        let params = TrajectoryParams::default();
        let report = object.advance(&params, 0.0, 1234.5);
        assert_eq!(report.name, "uav3");
        assert_eq!(report.timestamp, 1234.5);
        assert_eq!(report.position, sample(&params, 3, 0.0).position);
        assert_eq!(object.last_sample().map(|s| s.time), Some(0.0));
    }
}
