//! # Simulator
//!
//! Synthetic tracking server: N objects flying circular trajectories,
//! published through a [`TrackerTransport`] at a fixed tick.
//!
//! ## Lifecycle
//!
//! ```text
//! Unbound -> Bound -> Running -> { Failed | StoppedByUser }
//!    ^                              |
//!    +------ restart wait ----------+   (auto-restart, transport failure only)
//! ```
//!
//! The manager is single-threaded; the only outside input is the
//! [`CancellationToken`](contracts::CancellationToken), sampled once per tick.

pub mod error;
pub mod lifecycle;
pub mod object;
pub mod status;
pub mod trajectory;
pub mod transport;

pub use error::SimulatorError;
pub use lifecycle::{SessionState, SimulatorExit, SimulatorManager};
pub use object::TrackedObject;
pub use status::{unix_seconds, StatusPose, StatusRecord, StatusSink, TerminalStatus};
pub use trajectory::{sample, TrajectorySample};
pub use transport::{TrackerTransport, TransportBinder, UdpBinder};
