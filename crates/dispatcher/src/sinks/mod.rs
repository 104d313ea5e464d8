//! Sink implementations
//!
//! Contains UdpSink, SerialSink, LoggingSink and MemorySink.

mod log;
mod memory;
mod network;
mod serial;

pub use self::log::LoggingSink;
pub use self::memory::{MemorySink, MemorySinkHandle};
pub use self::network::UdpSink;
pub use self::serial::SerialSink;
