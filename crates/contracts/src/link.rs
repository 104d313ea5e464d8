//! Outbound link configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ContractError;

/// Baud rates accepted for the serial link
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [57_600, 115_200, 230_400, 460_800, 921_600];

/// Outbound transport kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Serial device (e.g. flight controller telemetry port)
    #[default]
    Serial,
    /// UDP datagrams to `host:port`
    Udp,
}

impl FromStr for LinkKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Self::Serial),
            "udp" => Ok(Self::Udp),
            other => Err(ContractError::config_validation(
                "link.kind",
                format!("unknown link type '{other}', expected 'serial' or 'udp'"),
            )),
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => f.write_str("serial"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// Serialization format of the outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// JSON (human-readable, larger)
    #[default]
    Json,
    /// Bincode (binary, compact)
    Bincode,
}

/// Outbound link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LinkConfig {
    /// Transport kind
    pub kind: LinkKind,

    /// Serial device path
    pub serial_device: PathBuf,

    /// Serial baud rate
    pub baud_rate: u32,

    /// UDP target (`host:port`)
    #[validate(length(min = 3))]
    pub udp_target: String,

    /// Link-layer system id
    pub system_id: u8,

    /// Link-layer component id
    pub component_id: u8,

    /// Serialization format
    pub format: WireFormat,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            kind: LinkKind::Serial,
            serial_device: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 921_600,
            udp_target: "127.0.0.1:14550".to_string(),
            system_id: 1,
            component_id: 1,
            format: WireFormat::Json,
        }
    }
}

impl LinkConfig {
    /// Human-readable target of the selected transport
    pub fn target(&self) -> String {
        match self.kind {
            LinkKind::Serial => self.serial_device.display().to_string(),
            LinkKind::Udp => self.udp_target.clone(),
        }
    }
}
