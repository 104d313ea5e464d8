//! # Dispatcher
//!
//! Outbound side of the bridge.
//!
//! Responsibilities:
//! - Drift-corrected fixed-rate schedule ([`PublishSchedule`])
//! - Publisher loop reading the pose cache ([`FixedRatePublisher`])
//! - Outbound sinks (UDP, serial, logging decorator, in-memory)
//! - Outbound message encoding

pub mod encoding;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod publisher;
pub mod schedule;
pub mod sinks;

pub use contracts::PoseSink;
pub use encoding::{MessageEncoder, VisionPositionEstimate};
pub use error::DispatcherError;
pub use factory::create_sink;
pub use metrics::{PublisherMetrics, PublisherStats};
pub use publisher::{FixedRatePublisher, PublisherConfig, TickOutcome};
pub use schedule::PublishSchedule;
pub use sinks::{LoggingSink, MemorySink, MemorySinkHandle, SerialSink, UdpSink};
