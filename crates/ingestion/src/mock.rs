//! Scripted pose source
//!
//! Used for tests without a tracking server. Each connect consumes one
//! scripted session; each poll consumes one step of that session.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{ContractError, Pose, PoseSource, PoseSourceConnector, TrackerAddress};
use tracing::trace;

/// One scripted poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    /// Poll succeeds and a new pose arrives
    Pose(Pose),
    /// Poll succeeds, nothing new
    Silent,
    /// Poll reports the connection as dead
    Drop,
}

/// Observation counters shared by the connector and its handles
#[derive(Debug, Default)]
pub struct ScriptProbe {
    connects: AtomicUsize,
    refused: AtomicUsize,
    live_handles: AtomicUsize,
    overlapping_connect: AtomicBool,
}

impl ScriptProbe {
    /// Successful connects
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Refused connects
    pub fn refused(&self) -> usize {
        self.refused.load(Ordering::SeqCst)
    }

    /// Handles currently alive
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    /// Whether a connect ever happened while an older handle was still alive
    pub fn saw_overlapping_connect(&self) -> bool {
        self.overlapping_connect.load(Ordering::SeqCst)
    }
}

/// Connector replaying scripted sessions
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    refuse_first: usize,
    sessions: VecDeque<Vec<ScriptStep>>,
    probe: Arc<ScriptProbe>,
}

impl ScriptedConnector {
    /// Create a connector with no sessions (every connect yields an idle handle)
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the first `count` connect attempts
    pub fn refuse_first(mut self, count: usize) -> Self {
        self.refuse_first = count;
        self
    }

    /// Append one session script
    pub fn session(mut self, steps: Vec<ScriptStep>) -> Self {
        self.sessions.push_back(steps);
        self
    }

    /// Shared counters
    pub fn probe(&self) -> Arc<ScriptProbe> {
        self.probe.clone()
    }
}

impl PoseSourceConnector for ScriptedConnector {
    type Source = ScriptedSource;

    fn connect(&mut self, address: &TrackerAddress) -> Result<Self::Source, ContractError> {
        if self.refuse_first > 0 {
            self.refuse_first -= 1;
            self.probe.refused.fetch_add(1, Ordering::SeqCst);
            return Err(ContractError::source_connection(
                address.to_string(),
                "connection refused (scripted)",
            ));
        }

        if self.probe.live_handles() > 0 {
            self.probe.overlapping_connect.store(true, Ordering::SeqCst);
        }
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        self.probe.live_handles.fetch_add(1, Ordering::SeqCst);

        let steps = self.sessions.pop_front().unwrap_or_default();
        trace!(address = %address, steps = steps.len(), "scripted session opened");
        Ok(ScriptedSource {
            steps: steps.into(),
            latest: None,
            probe: self.probe.clone(),
        })
    }
}

/// Handle replaying one scripted session
///
/// Once the script is exhausted the handle stays alive without new poses.
#[derive(Debug)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    latest: Option<Pose>,
    probe: Arc<ScriptProbe>,
}

impl PoseSource for ScriptedSource {
    fn poll_once(&mut self) -> bool {
        match self.steps.pop_front() {
            Some(ScriptStep::Pose(pose)) => {
                self.latest = Some(pose);
                true
            }
            Some(ScriptStep::Drop) => false,
            Some(ScriptStep::Silent) | None => true,
        }
    }

    fn latest_pose(&self) -> Option<Pose> {
        self.latest
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.probe.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
