//! Process configuration - Config Loader output
//!
//! Describes the bridge (tracking source -> telemetry link) and the
//! simulator (synthetic tracking server). Every field has a default, so a
//! configuration file only needs to name what it changes.

use std::f64::consts::PI;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{LinkConfig, TrackerAddress};

/// Which cached poses the publisher forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepublishPolicy {
    /// Forward only poses written since the last forwarded one
    #[default]
    OnWrite,
    /// Forward the cached pose at every tick
    EveryTick,
}

/// Bridge process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BridgeConfig {
    /// Tracker name on the tracking server (required)
    #[validate(length(min = 1, message = "tracker name is required"))]
    pub tracker: String,

    /// Tracking server host
    pub host: String,

    /// Tracking server port
    #[validate(range(min = 1))]
    pub port: u16,

    /// Publish rate (Hz)
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub rate_hz: f64,

    /// Outbound link
    #[validate(nested)]
    pub link: LinkConfig,

    /// Log every forwarded pose
    pub log_poses: bool,

    /// Publisher republish policy
    pub republish: RepublishPolicy,

    /// Extra transmit attempts before a sink failure becomes fatal
    #[validate(range(max = 10))]
    pub sink_retries: u32,

    /// Acquisition polling period (ms)
    #[validate(range(min = 1, max = 1000))]
    pub poll_period_ms: u64,

    /// Back-off after a failed poll (ms)
    #[validate(range(min = 1, max = 60000))]
    pub reconnect_backoff_ms: u64,

    /// Silence after which a connected source is considered dead (ms)
    #[validate(range(min = 10))]
    pub source_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tracker: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3883,
            rate_hz: 50.0,
            link: LinkConfig::default(),
            log_poses: false,
            republish: RepublishPolicy::OnWrite,
            sink_retries: 0,
            poll_period_ms: 2,
            reconnect_backoff_ms: 20,
            source_timeout_ms: 1000,
        }
    }
}

impl BridgeConfig {
    /// Address of the tracker to follow
    pub fn tracker_address(&self) -> TrackerAddress {
        TrackerAddress::new(self.tracker.clone(), &self.host, self.port)
    }

    /// Publish interval `T = 1 / rate`
    pub fn publish_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

/// How status lines are written to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// One line per status record
    #[default]
    Append,
    /// Overwrite the current terminal line
    Inline,
}

/// Parameters of the circular test trajectories
///
/// Object `i` flies a circle of radius `r0 + r_step*i` at height
/// `z0 + z_step*i`, with angular velocity `w0 + w_step*i` and phase
/// `i * phase_step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryParams {
    pub r0: f64,
    pub r_step: f64,
    pub w0: f64,
    pub w_step: f64,
    pub phase_step: f64,
    pub z0: f64,
    pub z_step: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            r0: 2.0,
            r_step: 0.1,
            w0: 0.2,
            w_step: 0.01,
            phase_step: PI / 16.0,
            z0: 1.0,
            z_step: 0.05,
        }
    }
}

/// Simulator process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Bind string (`:port`, `host:port` or `vrpn:host:port`)
    pub bind_address: String,

    /// Number of simulated trackers
    #[validate(range(min = 1, max = 4096))]
    pub tracker_count: usize,

    /// Publish rate (Hz)
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub rate_hz: f64,

    /// Suppress status output
    pub quiet: bool,

    /// Simulated seconds between status records (0 disables)
    pub status_interval_s: f64,

    /// Terminal status mode
    pub status_mode: StatusMode,

    /// Embed a tracker pose in status records
    pub status_include_pose: bool,

    /// Tracker whose pose is embedded in status records
    pub status_tracker: usize,

    /// Rebind after a transport failure
    pub auto_restart: bool,

    /// Delay before rebinding (seconds)
    pub restart_delay_s: f64,

    /// Trajectory parameters
    pub trajectory: TrajectoryParams,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind_address: ":3883".to_string(),
            tracker_count: 32,
            rate_hz: 50.0,
            quiet: false,
            status_interval_s: 5.0,
            status_mode: StatusMode::Append,
            status_include_pose: true,
            status_tracker: 0,
            auto_restart: false,
            restart_delay_s: 1.0,
            trajectory: TrajectoryParams::default(),
        }
    }
}

impl SimulatorConfig {
    /// Clamp values that are tolerated rather than rejected
    pub fn normalized(mut self) -> Self {
        if self.status_interval_s.is_nan() || self.status_interval_s < 0.0 {
            self.status_interval_s = 0.0;
        }
        if self.restart_delay_s.is_nan() || self.restart_delay_s < 0.0 {
            self.restart_delay_s = 0.0;
        }
        self
    }

    /// Simulation tick `dt = 1 / rate` (seconds)
    pub fn dt(&self) -> f64 {
        1.0 / self.rate_hz
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.restart_delay_s).unwrap_or(Duration::ZERO)
    }

    /// Index of the tracker reported in status records, clamped into range
    pub fn status_tracker_index(&self) -> usize {
        self.status_tracker.min(self.tracker_count.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.port, 3883);
        assert_eq!(config.publish_period(), Duration::from_millis(20));
        assert_eq!(config.poll_period(), Duration::from_millis(2));
        assert_eq!(config.reconnect_backoff(), Duration::from_millis(20));
        assert_eq!(config.republish, RepublishPolicy::OnWrite);
    }

    #[test]
    fn test_bridge_requires_tracker() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_err());

        let config = BridgeConfig {
            tracker: "uav0".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bridge_rejects_non_positive_rate() {
        let config = BridgeConfig {
            tracker: "uav0".to_string(),
            rate_hz: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tracker_address_normalizes_host() {
        let config = BridgeConfig {
            tracker: "uav3".to_string(),
            host: "localhost".to_string(),
            ..Default::default()
        };
        assert_eq!(config.tracker_address().to_string(), "uav3@127.0.0.1:3883");
    }

    #[test]
    fn test_simulator_normalized_clamps_negatives() {
        let config = SimulatorConfig {
            status_interval_s: -1.0,
            restart_delay_s: -3.0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.status_interval_s, 0.0);
        assert_eq!(config.restart_delay(), Duration::ZERO);
    }

    #[test]
    fn test_status_tracker_index_clamped() {
        let config = SimulatorConfig {
            tracker_count: 4,
            status_tracker: 10,
            ..Default::default()
        };
        assert_eq!(config.status_tracker_index(), 3);
    }

    #[test]
    fn test_simulator_rejects_zero_trackers() {
        let config = SimulatorConfig {
            tracker_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
