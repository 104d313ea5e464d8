//! # Ingestion
//!
//! Pose acquisition module.
//!
//! Responsibilities:
//! - Keep a single-slot, latest-value [`PoseCache`]
//! - Poll a tracking source, reconnecting on failure ([`AcquisitionLoop`])
//! - Count polls, failures and reconnects
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{AcquisitionConfig, AcquisitionLoop, PoseCache};
//!
//! let cache = Arc::new(PoseCache::new());
//! let acquisition = AcquisitionLoop::new(connector, address, cache.clone(), AcquisitionConfig::default());
//! let stats = acquisition.run(&cancel);
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::ScriptedConnector;
//!
//! let connector = ScriptedConnector::new().session(vec![ScriptStep::Pose(pose)]);
//! ```

mod acquisition;
mod cache;
mod config;
mod mock;

// Re-exports
pub use acquisition::{AcquisitionLoop, StepOutcome};
pub use cache::{CachedPose, PoseCache};
pub use config::{AcquisitionConfig, AcquisitionMetrics, AcquisitionStats};
pub use mock::{ScriptProbe, ScriptStep, ScriptedConnector, ScriptedSource};
