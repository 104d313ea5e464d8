//! TrackerAddress - `name@host:port` identity of one tracked body

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Map loopback aliases onto the IPv4 loopback address.
///
/// `localhost`, `::1` and the empty string all become `127.0.0.1`;
/// anything else is returned unchanged.
pub fn normalize_host(host: &str) -> String {
    match host.trim() {
        "" | "localhost" | "::1" => "127.0.0.1".to_string(),
        other => other.to_string(),
    }
}

/// Port used when a bind string does not name one
pub const DEFAULT_TRACKER_PORT: u16 = 3883;

/// Turn a tracking-server bind string into a socket address.
///
/// Accepted forms: empty (default port), `:port`, `host:port` and the same
/// with a `vrpn:` prefix. Only the port is honoured; the server always
/// listens on all interfaces. Returns the address and whether the host part
/// was discarded.
pub fn parse_bind_address(bind: &str) -> Result<(SocketAddr, bool), ContractError> {
    let trimmed = bind.trim();
    let trimmed = trimmed.strip_prefix("vrpn:").unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok((SocketAddr::from(([0, 0, 0, 0], DEFAULT_TRACKER_PORT)), false));
    }

    let (host, port) = trimmed.rsplit_once(':').ok_or_else(|| {
        ContractError::config_validation("bind_address", format!("'{bind}' has no port"))
    })?;
    let port = port.parse::<u16>().map_err(|e| {
        ContractError::config_validation("bind_address", format!("invalid port in '{bind}': {e}"))
    })?;
    Ok((SocketAddr::from(([0, 0, 0, 0], port)), !host.is_empty()))
}

/// Address of a tracker on a tracking server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerAddress {
    /// Tracker name on the server (e.g. `uav0`)
    pub name: String,
    /// Server host (normalised)
    pub host: String,
    /// Server port
    pub port: u16,
}

impl TrackerAddress {
    /// Create an address, normalising the host
    pub fn new(name: impl Into<String>, host: &str, port: u16) -> Self {
        Self {
            name: name.into(),
            host: normalize_host(host),
            port,
        }
    }

    /// Resolve the server endpoint
    pub fn socket_addr(&self) -> Result<SocketAddr, ContractError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ContractError::source_connection(self.to_string(), e.to_string()))?
            .next()
            .ok_or_else(|| {
                ContractError::source_connection(self.to_string(), "host resolved to no address")
            })
    }
}

impl fmt::Display for TrackerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.host, self.port)
    }
}

impl FromStr for TrackerAddress {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, endpoint) = s.split_once('@').ok_or_else(|| {
            ContractError::config_validation("tracker_address", "expected name@host:port")
        })?;
        if name.is_empty() {
            return Err(ContractError::config_validation(
                "tracker_address",
                "tracker name cannot be empty",
            ));
        }
        let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
            ContractError::config_validation("tracker_address", "expected name@host:port")
        })?;
        let port = port.parse::<u16>().map_err(|e| {
            ContractError::config_validation("tracker_address", format!("invalid port: {e}"))
        })?;
        Ok(Self::new(name, host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("localhost"), "127.0.0.1");
        assert_eq!(normalize_host("::1"), "127.0.0.1");
        assert_eq!(normalize_host(""), "127.0.0.1");
        assert_eq!(normalize_host("192.168.1.50"), "192.168.1.50");
    }

    #[test]
    fn test_display_and_parse() {
        let addr = TrackerAddress::new("uav5", "localhost", 4000);
        assert_eq!(addr.to_string(), "uav5@127.0.0.1:4000");

        let parsed: TrackerAddress = "uav5@127.0.0.1:4000".parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("uav0".parse::<TrackerAddress>().is_err());
        assert!("@127.0.0.1:3883".parse::<TrackerAddress>().is_err());
        assert!("uav0@127.0.0.1:notaport".parse::<TrackerAddress>().is_err());
    }

    #[test]
    fn test_parse_bind_address() {
        let (addr, dropped) = parse_bind_address(":4000").unwrap();
        assert_eq!(addr, "0.0.0.0:4000".parse().unwrap());
        assert!(!dropped);

        let (addr, dropped) = parse_bind_address("").unwrap();
        assert_eq!(addr.port(), DEFAULT_TRACKER_PORT);
        assert!(!dropped);

        let (addr, dropped) = parse_bind_address("vrpn:192.168.1.10:3900").unwrap();
        assert_eq!(addr, "0.0.0.0:3900".parse().unwrap());
        assert!(dropped);

        assert!(parse_bind_address("localhost").is_err());
        assert!(parse_bind_address(":http").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = TrackerAddress::new("uav0", "127.0.0.1", 3883);
        assert_eq!(addr.socket_addr().unwrap(), "127.0.0.1:3883".parse().unwrap());
    }
}
