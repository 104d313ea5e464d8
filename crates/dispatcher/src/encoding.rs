//! Outbound telemetry message
//!
//! A vision-position-estimate style record: pose in metres/radians, a
//! microsecond timestamp and the link identifiers.

use contracts::{ContractError, LinkConfig, Pose, WireFormat};
use serde::{Deserialize, Serialize};

/// Number of entries in the upper-triangular 6x6 covariance
pub const COVARIANCE_LEN: usize = 21;

/// Outbound pose message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionPositionEstimate {
    pub system_id: u8,
    pub component_id: u8,
    /// Pose timestamp in microseconds
    pub usec: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Unknown covariance, all zeros
    pub covariance: [f32; COVARIANCE_LEN],
    pub reset_counter: u8,
}

impl VisionPositionEstimate {
    pub fn from_pose(pose: &Pose, system_id: u8, component_id: u8) -> Self {
        Self {
            system_id,
            component_id,
            // Negative and NaN timestamps saturate to 0
            usec: (pose.timestamp * 1e6) as u64,
            x: pose.position.x as f32,
            y: pose.position.y as f32,
            z: pose.position.z as f32,
            roll: pose.orientation.roll as f32,
            pitch: pose.orientation.pitch as f32,
            yaw: pose.orientation.yaw as f32,
            covariance: [0.0; COVARIANCE_LEN],
            reset_counter: 0,
        }
    }
}

/// Serializes poses for one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEncoder {
    format: WireFormat,
    system_id: u8,
    component_id: u8,
}

impl MessageEncoder {
    pub fn new(format: WireFormat, system_id: u8, component_id: u8) -> Self {
        Self {
            format,
            system_id,
            component_id,
        }
    }

    pub fn from_link(link: &LinkConfig) -> Self {
        Self::new(link.format, link.system_id, link.component_id)
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn message(&self, pose: &Pose) -> VisionPositionEstimate {
        VisionPositionEstimate::from_pose(pose, self.system_id, self.component_id)
    }

    /// Encode one pose
    pub fn encode(&self, pose: &Pose) -> Result<Vec<u8>, ContractError> {
        let message = self.message(pose);
        match self.format {
            WireFormat::Json => serde_json::to_vec(&message)
                .map_err(|e| ContractError::codec(format!("json error: {e}"))),
            WireFormat::Bincode => bincode::serialize(&message)
                .map_err(|e| ContractError::codec(format!("bincode error: {e}"))),
        }
    }

    /// Decode one message (used by receivers and tests)
    pub fn decode(&self, data: &[u8]) -> Result<VisionPositionEstimate, ContractError> {
        match self.format {
            WireFormat::Json => serde_json::from_slice(data)
                .map_err(|e| ContractError::codec(format!("json error: {e}"))),
            WireFormat::Bincode => bincode::deserialize(data)
                .map_err(|e| ContractError::codec(format!("bincode error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Quaternion, Vector3};

    fn pose() -> Pose {
        Pose::from_quaternion(
            12.5,
            Vector3::new(1.0, -2.0, 0.5),
            Quaternion::from_yaw(0.25),
        )
    }

    #[test]
    fn test_message_fields() {
        let message = VisionPositionEstimate::from_pose(&pose(), 1, 197);
        assert_eq!(message.usec, 12_500_000);
        assert_eq!(message.system_id, 1);
        assert_eq!(message.component_id, 197);
        assert_eq!(message.x, 1.0);
        assert_eq!(message.y, -2.0);
        assert!((message.yaw - 0.25).abs() < 1e-6);
        assert!(message.covariance.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_negative_timestamp_saturates() {
        let mut p = pose();
        p.timestamp = -1.0;
        assert_eq!(VisionPositionEstimate::from_pose(&p, 1, 1).usec, 0);
    }

    #[test]
    fn test_json_and_bincode_decode_back() {
        for format in [WireFormat::Json, WireFormat::Bincode] {
            let encoder = MessageEncoder::new(format, 3, 4);
            let bytes = encoder.encode(&pose()).unwrap();
            let decoded = encoder.decode(&bytes).unwrap();
            assert_eq!(decoded, encoder.message(&pose()));
        }
    }

    #[test]
    fn test_bincode_is_fixed_size() {
        let encoder = MessageEncoder::new(WireFormat::Bincode, 1, 1);
        // 2 ids + u64 + 6 f32 + 21 f32 + reset counter
        assert_eq!(encoder.encode(&pose()).unwrap().len(), 2 + 8 + 24 + 84 + 1);
    }
}
