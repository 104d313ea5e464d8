//! Latest-value pose cache shared by the acquisition and publisher threads

use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::Pose;

/// Cached pose together with the write that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPose {
    /// Copy of the stored pose
    pub pose: Pose,
    /// Write sequence number (1 for the first write)
    pub seq: u64,
}

#[derive(Debug, Default)]
struct Slot {
    pose: Option<Pose>,
    seq: u64,
}

/// Single-slot, overwrite-only pose store
///
/// One writer, one reader. Reads hand out copies; newest write wins.
#[derive(Debug, Default)]
pub struct PoseCache {
    slot: Mutex<Slot>,
}

impl PoseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored pose
    pub fn write(&self, pose: Pose) {
        let mut slot = self.lock();
        slot.pose = Some(pose);
        slot.seq = slot.seq.wrapping_add(1);
    }

    /// Copy of the stored pose, `None` if never written
    pub fn read(&self) -> Option<Pose> {
        self.lock().pose
    }

    /// Copy of the stored pose plus its write sequence number
    pub fn snapshot(&self) -> Option<CachedPose> {
        let slot = self.lock();
        slot.pose.map(|pose| CachedPose {
            pose,
            seq: slot.seq,
        })
    }

    /// Number of writes so far
    pub fn write_count(&self) -> u64 {
        self.lock().seq
    }

    // The slot holds plain Copy data, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
