//! LoggingSink - logs every forwarded pose via tracing

use contracts::{ContractError, Pose, PoseSink};
use tracing::{info, instrument};

/// Decorator that logs each pose its inner sink accepted
pub struct LoggingSink<S> {
    inner: S,
}

impl<S: PoseSink> LoggingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn log_pose(&self, pose: &Pose) {
        info!(
            sink = %self.inner.name(),
            t = pose.timestamp,
            x = pose.position.x,
            y = pose.position.y,
            z = pose.position.z,
            roll = pose.orientation.roll,
            pitch = pose.orientation.pitch,
            yaw = pose.orientation.yaw,
            "pose forwarded"
        );
    }
}

impl<S: PoseSink> PoseSink for LoggingSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError> {
        self.inner.transmit(pose)?;
        self.log_pose(pose);
        Ok(())
    }

    #[instrument(name = "logging_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        self.inner.close()
    }
}
