//! Circular test trajectories
//!
//! Pure function of (object index, simulated time); no state is kept, so a
//! restarted simulator reproduces the exact same poses.

use contracts::{Quaternion, TrajectoryParams, Vector3};

/// One evaluated trajectory point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub index: usize,
    /// Simulated time (seconds)
    pub time: f64,
    pub radius: f64,
    pub angular_velocity: f64,
    pub phase: f64,
    /// `angular_velocity * time + phase`
    pub angle: f64,
    pub position: Vector3,
    /// Pure yaw by `angle`
    pub orientation: Quaternion,
}

/// Evaluate the trajectory of object `index` at simulated time `time`
pub fn sample(params: &TrajectoryParams, index: usize, time: f64) -> TrajectorySample {
    let i = index as f64;
    let radius = params.r0 + params.r_step * i;
    let angular_velocity = params.w0 + params.w_step * i;
    let phase = i * params.phase_step;
    let angle = angular_velocity * time + phase;

    let half = angle * 0.5;
    TrajectorySample {
        index,
        time,
        radius,
        angular_velocity,
        phase,
        angle,
        position: Vector3::new(
            radius * angle.cos(),
            radius * angle.sin(),
            params.z0 + params.z_step * i,
        ),
        orientation: Quaternion::new(0.0, 0.0, half.sin(), half.cos()),
    }
}
