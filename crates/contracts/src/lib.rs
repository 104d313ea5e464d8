//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the pose relay.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Pose timestamps are seconds (f64) in the clock domain of the tracking source
//! - Scheduling inside the loops uses the monotonic clock (`std::time::Instant`)

mod cancel;
mod config;
mod error;
mod link;
mod pose;
mod pose_source;
mod sink;
mod tracker_address;

pub use cancel::CancellationToken;
pub use config::*;
pub use error::*;
pub use link::*;
pub use pose::*;
pub use pose_source::{PoseSource, PoseSourceConnector};
pub use sink::PoseSink;
pub use tracker_address::{
    normalize_host, parse_bind_address, TrackerAddress, DEFAULT_TRACKER_PORT,
};
