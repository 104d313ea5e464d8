//! Configuration validation module
//!
//! Validation rules:
//! - field ranges declared with `validator` derives (rates > 0, tracker name required, ...)
//! - serial baud rate is one of the supported rates
//! - UDP target is a literal `host:port` socket address
//! - simulator bind string carries a numeric port
//! - trajectory parameters are finite

use std::net::SocketAddr;

use contracts::{
    parse_bind_address, BridgeConfig, ContractError, LinkConfig, LinkKind, SimulatorConfig,
    TrajectoryParams, SUPPORTED_BAUD_RATES,
};
use validator::Validate;

/// Configuration that can be checked after parsing
pub trait ValidatedConfig {
    /// Returns the first error encountered, or Ok(())
    fn check(&self) -> Result<(), ContractError>;
}

impl ValidatedConfig for BridgeConfig {
    fn check(&self) -> Result<(), ContractError> {
        check_derived("bridge", self)?;
        validate_link(&self.link)?;
        Ok(())
    }
}

impl ValidatedConfig for SimulatorConfig {
    fn check(&self) -> Result<(), ContractError> {
        check_derived("simulator", self)?;
        parse_bind_address(&self.bind_address)?;
        validate_trajectory(&self.trajectory)?;
        Ok(())
    }
}

/// Run the derive-declared rules
fn check_derived<T: Validate>(section: &str, config: &T) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation(section, e.to_string()))
}

/// Validate the outbound link for the selected transport kind
fn validate_link(link: &LinkConfig) -> Result<(), ContractError> {
    match link.kind {
        LinkKind::Serial => {
            if link.serial_device.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    "link.serial_device",
                    "serial device cannot be empty",
                ));
            }
            if !SUPPORTED_BAUD_RATES.contains(&link.baud_rate) {
                return Err(ContractError::config_validation(
                    "link.baud_rate",
                    format!(
                        "unsupported baud rate {}, expected one of {:?}",
                        link.baud_rate, SUPPORTED_BAUD_RATES
                    ),
                ));
            }
        }
        LinkKind::Udp => {
            link.udp_target.parse::<SocketAddr>().map_err(|e| {
                ContractError::config_validation(
                    "link.udp_target",
                    format!("'{}' is not host:port: {e}", link.udp_target),
                )
            })?;
        }
    }
    Ok(())
}

/// Validate trajectory parameters
fn validate_trajectory(params: &TrajectoryParams) -> Result<(), ContractError> {
    let values = [
        ("r0", params.r0),
        ("r_step", params.r_step),
        ("w0", params.w0),
        ("w_step", params.w_step),
        ("phase_step", params.phase_step),
        ("z0", params.z0),
        ("z_step", params.z_step),
    ];
    for (name, value) in values {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                format!("trajectory.{name}"),
                format!("must be finite, got {value}"),
            ));
        }
    }
    Ok(())
}
