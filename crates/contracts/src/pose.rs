//! Pose - the value carried from the tracking source to the telemetry link
//!
//! Orientation is converted from a unit quaternion exactly once, when the
//! pose is created. Downstream consumers only ever see Euler angles.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// 3D vector (meters, source frame)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion, scalar last
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `yaw` radians about the z axis
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self::new(0.0, 0.0, half.sin(), half.cos())
    }

    /// Closed-form conversion to roll/pitch/yaw.
    ///
    /// When the pitch argument reaches ±1 (gimbal lock) the pitch is clamped
    /// to ±π/2 instead of calling `asin` with an out-of-domain value.
    pub fn to_euler(&self) -> EulerAngles {
        let Self { x, y, z, w } = *self;

        let sinr_cosp = 2.0 * (w * x + y * z);
        let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp);

        let sinp = 2.0 * (w * y - z * x);
        let pitch = if sinp.abs() >= 1.0 {
            FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };

        let siny_cosp = 2.0 * (w * z + x * y);
        let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp);

        EulerAngles { roll, pitch, yaw }
    }
}

/// Roll / pitch / yaw in radians
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Timestamped 6-DoF sample
///
/// Immutable once constructed; moved around by value (`Copy`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Source timestamp (seconds)
    pub timestamp: f64,

    /// Position (meters)
    pub position: Vector3,

    /// Orientation (radians)
    pub orientation: EulerAngles,
}

impl Pose {
    /// Build a pose from a source sample carrying a quaternion
    pub fn from_quaternion(timestamp: f64, position: Vector3, orientation: Quaternion) -> Self {
        Self {
            timestamp,
            position,
            orientation: orientation.to_euler(),
        }
    }
}
