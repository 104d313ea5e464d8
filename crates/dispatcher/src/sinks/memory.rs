//! MemorySink - records poses in memory (tests and dry runs)

use std::sync::{Arc, Mutex, PoisonError};

use contracts::{ContractError, Pose, PoseSink};

#[derive(Debug, Default)]
struct Recorded {
    poses: Vec<Pose>,
    attempts: usize,
    closed: bool,
}

/// Shared view of what a [`MemorySink`] received
#[derive(Debug, Clone, Default)]
pub struct MemorySinkHandle {
    recorded: Arc<Mutex<Recorded>>,
}

impl MemorySinkHandle {
    /// Poses accepted so far
    pub fn poses(&self) -> Vec<Pose> {
        self.lock(|r| r.poses.clone())
    }

    /// Number of accepted poses
    pub fn len(&self) -> usize {
        self.lock(|r| r.poses.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transmit calls including failed ones
    pub fn attempts(&self) -> usize {
        self.lock(|r| r.attempts)
    }

    pub fn is_closed(&self) -> bool {
        self.lock(|r| r.closed)
    }

    fn lock<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }
}

/// Sink that keeps every pose it receives
///
/// Failures can be scripted: the first `fail_first` attempts fail, and once
/// `fail_after` poses were accepted every further attempt fails.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    handle: MemorySinkHandle,
    fail_first: usize,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: MemorySinkHandle::default(),
            fail_first: 0,
            fail_after: None,
        }
    }

    /// Fail the first `count` transmit attempts
    pub fn fail_first(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    /// Fail every attempt once `count` poses were accepted
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn handle(&self) -> MemorySinkHandle {
        self.handle.clone()
    }
}

impl PoseSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError> {
        let fail_first = self.fail_first;
        let fail_after = self.fail_after;
        let accepted = self.handle.lock(|r| {
            r.attempts += 1;
            let refused = r.attempts <= fail_first
                || fail_after.is_some_and(|limit| r.poses.len() >= limit);
            if !refused {
                r.poses.push(*pose);
            }
            !refused
        });

        if accepted {
            Ok(())
        } else {
            Err(ContractError::sink_write(&self.name, "scripted failure"))
        }
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.handle.lock(|r| r.closed = true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Quaternion, Vector3};

    fn pose(t: f64) -> Pose {
        Pose::from_quaternion(t, Vector3::default(), Quaternion::IDENTITY)
    }

    #[test]
    fn test_records_poses() {
        let mut sink = MemorySink::new("mem");
        let handle = sink.handle();
        sink.transmit(&pose(1.0)).unwrap();
        sink.transmit(&pose(2.0)).unwrap();
        assert_eq!(handle.poses(), vec![pose(1.0), pose(2.0)]);
        sink.close().unwrap();
        assert!(handle.is_closed());
    }

    #[test]
    fn test_scripted_failures() {
        let mut sink = MemorySink::new("mem").fail_first(1).fail_after(2);
        let handle = sink.handle();
        assert!(sink.transmit(&pose(1.0)).is_err());
        assert!(sink.transmit(&pose(2.0)).is_ok());
        assert!(sink.transmit(&pose(3.0)).is_ok());
        assert!(sink.transmit(&pose(4.0)).is_err());
        assert_eq!(handle.len(), 2);
        assert_eq!(handle.attempts(), 4);
    }
}
