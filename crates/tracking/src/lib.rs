//! # Tracking
//!
//! Minimal UDP tracking protocol used between the simulator and the bridge.
//!
//! - [`codec`]: subscribe / report datagrams
//! - [`UdpTrackerConnector`]: pose source for the bridge's acquisition loop
//! - [`UdpTrackerServer`]: report fan-out used by the simulator

pub mod client;
pub mod codec;
pub mod error;
pub mod server;

pub use client::{ClientConfig, UdpTrackerClient, UdpTrackerConnector};
pub use codec::{Datagram, TrackerReport, PROTOCOL_VERSION};
pub use error::TrackingError;
pub use server::{ServerConfig, UdpTrackerServer};
