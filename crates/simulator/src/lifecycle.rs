//! Bind / run / teardown / restart state machine

use std::net::SocketAddr;
use std::time::Duration;

use contracts::{parse_bind_address, CancellationToken, ContractError, SimulatorConfig};
use observability::metrics;
use tracing::{debug, error, info, instrument, warn};

use crate::error::SimulatorError;
use crate::object::TrackedObject;
use crate::status::{unix_seconds, StatusPose, StatusRecord, StatusSink};
use crate::transport::{TrackerTransport, TransportBinder};

/// Where the manager currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound,
    Running,
    /// Transport failed (or could not be bound)
    Failed,
    /// Cancellation observed
    StoppedByUser,
}

/// Why [`SimulatorManager::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorExit {
    Cancelled,
    BindFailed,
    /// Transport failed and auto-restart is off
    ConnectionLost,
}

impl SimulatorExit {
    /// Process exit status
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Cancelled => 0,
            Self::BindFailed | Self::ConnectionLost => 1,
        }
    }
}

/// Transport plus the objects published through it, created and dropped
/// as one unit
struct Session<T> {
    transport: T,
    objects: Vec<TrackedObject>,
}

impl<T: TrackerTransport> Session<T> {
    fn spawn(mut transport: T, count: usize) -> Self {
        let objects: Vec<_> = (0..count).map(TrackedObject::new).collect();
        for object in &objects {
            transport.add_tracker(object.name());
            debug!(tracker = object.name(), "spawned tracker");
        }
        Self { transport, objects }
    }
}

/// Decides when a status record is due, in simulated time
#[derive(Debug)]
struct StatusCadence {
    interval: f64,
    last: f64,
}

impl StatusCadence {
    fn new(interval: f64) -> Self {
        Self {
            interval,
            last: -interval,
        }
    }

    fn due(&mut self, sim_time: f64) -> bool {
        if self.interval <= 0.0 || sim_time - self.last < self.interval {
            return false;
        }
        self.last = sim_time;
        true
    }
}

/// Drives the synthetic tracking server
pub struct SimulatorManager<B: TransportBinder, S: StatusSink> {
    config: SimulatorConfig,
    bind_addr: SocketAddr,
    tick: Duration,
    binder: B,
    status: S,
    state: SessionState,
    sim_time: f64,
    restarts: u32,
}

impl<B: TransportBinder, S: StatusSink> SimulatorManager<B, S> {
    /// Resolve the bind address and check the tick rate
    pub fn new(config: SimulatorConfig, binder: B, status: S) -> Result<Self, SimulatorError> {
        let config = config.normalized();
        if !(config.rate_hz.is_finite() && config.rate_hz > 0.0) {
            return Err(ContractError::config_validation("rate_hz", "must be a positive number").into());
        }
        if config.tracker_count == 0 {
            return Err(ContractError::config_validation("tracker_count", "must be at least 1").into());
        }

        let (bind_addr, host_dropped) = parse_bind_address(&config.bind_address)?;
        if host_dropped {
            warn!(
                bind = %config.bind_address,
                port = bind_addr.port(),
                "only the port of the bind address is used; listening on all interfaces"
            );
        }

        let tick = Duration::try_from_secs_f64(config.dt())
            .map_err(|e| ContractError::config_validation("rate_hz", e.to_string()))?;
        Ok(Self {
            config,
            bind_addr,
            tick,
            binder,
            status,
            state: SessionState::Unbound,
            sim_time: 0.0,
            restarts: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Simulated seconds since the current session started
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Run sessions until cancelled or until a failure is not recovered
    #[instrument(
        name = "simulator_run",
        skip(self, cancel),
        fields(bind = %self.bind_addr, trackers = self.config.tracker_count, rate_hz = self.config.rate_hz)
    )]
    pub fn run(&mut self, cancel: &CancellationToken) -> SimulatorExit {
        let exit = self.run_sessions(cancel);
        if let Err(e) = self.status.finish() {
            warn!(error = %e, "status output failed");
        }
        info!(exit = ?exit, restarts = self.restarts, "simulator stopped");
        exit
    }

    fn run_sessions(&mut self, cancel: &CancellationToken) -> SimulatorExit {
        loop {
            if cancel.is_cancelled() {
                self.state = SessionState::StoppedByUser;
                return SimulatorExit::Cancelled;
            }

            self.state = SessionState::Unbound;
            let transport = match self.binder.bind(self.bind_addr) {
                Ok(transport) => transport,
                Err(e) => {
                    error!(error = %e, "failed to bind tracker transport");
                    self.state = SessionState::Failed;
                    return SimulatorExit::BindFailed;
                }
            };
            self.state = SessionState::Bound;
            info!(addr = %self.bind_addr, "tracker transport bound");

            let mut session = Session::spawn(transport, self.config.tracker_count);
            self.state = SessionState::Running;
            let connection_failed = self.run_session(&mut session, cancel);

            drop(session);
            debug!("session torn down");

            if !connection_failed {
                self.state = SessionState::StoppedByUser;
                return SimulatorExit::Cancelled;
            }

            self.state = SessionState::Failed;
            if !self.config.auto_restart {
                error!("transport failed; auto-restart is disabled");
                return SimulatorExit::ConnectionLost;
            }

            self.restarts += 1;
            metrics::record_sim_restart();
            let delay = self.config.restart_delay();
            info!(delay_s = delay.as_secs_f64(), restarts = self.restarts, "restarting transport");
            if cancel.sleep(delay) {
                self.state = SessionState::StoppedByUser;
                return SimulatorExit::Cancelled;
            }
            self.sim_time = 0.0;
        }
    }

    /// Tick until the transport fails (`true`) or cancellation (`false`)
    fn run_session(&mut self, session: &mut Session<B::Transport>, cancel: &CancellationToken) -> bool {
        let dt = self.config.dt();
        let mut cadence = StatusCadence::new(self.config.status_interval_s);

        loop {
            let timestamp = unix_seconds();
            for object in &mut session.objects {
                let report = object.advance(&self.config.trajectory, self.sim_time, timestamp);
                if let Err(e) = session.transport.report(&report) {
                    warn!(error = %e, tracker = object.name(), "report failed");
                    return true;
                }
            }

            session.transport.service();
            if !session.transport.is_healthy() {
                warn!(sim_time = self.sim_time, "tracker transport reported an error");
                return true;
            }

            if cancel.is_cancelled() || cancel.sleep(self.tick) {
                return false;
            }
            self.sim_time += dt;

            metrics::record_sim_tick(self.sim_time, session.objects.len());
            metrics::record_sim_subscribers(session.transport.subscriber_count());

            if !self.config.quiet && cadence.due(self.sim_time) {
                let record = self.status_record(&session.objects);
                if let Err(e) = self.status.emit(&record) {
                    warn!(error = %e, "status output failed");
                }
            }
        }
    }

    fn status_record(&self, objects: &[TrackedObject]) -> StatusRecord {
        let pose = if self.config.status_include_pose {
            let tracker = self.config.status_tracker_index();
            objects
                .get(tracker)
                .and_then(TrackedObject::last_sample)
                .map(|s| StatusPose {
                    tracker,
                    position: s.position,
                    orientation: s.orientation,
                })
        } else {
            None
        };

        StatusRecord {
            unix_time: unix_seconds(),
            sim_time: self.sim_time,
            trackers: objects.len(),
            interval_s: self.config.status_interval_s,
            pose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TerminalStatus;
    use crate::trajectory::sample;
    use contracts::{StatusMode, TrajectoryParams};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use tracking::TrackerReport;

    /// What happened across all sessions of one test
    #[derive(Debug, Default)]
    struct Probe {
        bind_attempts: usize,
        live_transports: usize,
        overlapping_bind: bool,
        /// Trackers registered, per session
        trackers: Vec<Vec<String>>,
        /// Reports sent, per session
        reports: Vec<Vec<TrackerReport>>,
    }

    struct MockTransport {
        probe: Arc<Mutex<Probe>>,
        session: usize,
        /// Services left before turning unhealthy (`None` = never)
        fail_after: Option<usize>,
        healthy: bool,
    }

    impl TrackerTransport for MockTransport {
        fn add_tracker(&mut self, name: &str) {
            self.probe.lock().unwrap().trackers[self.session].push(name.to_string());
        }

        fn report(&mut self, report: &TrackerReport) -> Result<(), SimulatorError> {
            self.probe.lock().unwrap().reports[self.session].push(report.clone());
            Ok(())
        }

        fn service(&mut self) {
            if let Some(left) = self.fail_after.as_mut() {
                if *left == 0 {
                    self.healthy = false;
                } else {
                    *left -= 1;
                }
            }
        }

        fn is_healthy(&self) -> bool {
            self.healthy
        }
    }

    impl Drop for MockTransport {
        fn drop(&mut self) {
            self.probe.lock().unwrap().live_transports -= 1;
        }
    }

    /// Each entry is one bind: `Some(n)` fails after `n` services,
    /// `None` refuses to bind. An exhausted script refuses.
    struct MockBinder {
        script: VecDeque<Option<Option<usize>>>,
        probe: Arc<Mutex<Probe>>,
    }

    impl MockBinder {
        fn new(script: Vec<Option<Option<usize>>>) -> (Self, Arc<Mutex<Probe>>) {
            let probe = Arc::new(Mutex::new(Probe::default()));
            let binder = Self {
                script: script.into(),
                probe: probe.clone(),
            };
            (binder, probe)
        }
    }

    impl TransportBinder for MockBinder {
        type Transport = MockTransport;

        fn bind(&mut self, addr: SocketAddr) -> Result<MockTransport, SimulatorError> {
            let mut probe = self.probe.lock().unwrap();
            probe.bind_attempts += 1;
            if probe.live_transports > 0 {
                probe.overlapping_bind = true;
            }
            match self.script.pop_front().flatten() {
                Some(fail_after) => {
                    probe.live_transports += 1;
                    probe.trackers.push(Vec::new());
                    probe.reports.push(Vec::new());
                    Ok(MockTransport {
                        probe: self.probe.clone(),
                        session: probe.reports.len() - 1,
                        fail_after,
                        healthy: true,
                    })
                }
                None => Err(SimulatorError::bind(addr, "address in use")),
            }
        }
    }

    fn config(auto_restart: bool) -> SimulatorConfig {
        SimulatorConfig {
            bind_address: ":0".to_string(),
            tracker_count: 4,
            rate_hz: 1000.0,
            quiet: true,
            status_interval_s: 0.0,
            auto_restart,
            restart_delay_s: 0.005,
            ..Default::default()
        }
    }

    fn manager(
        config: SimulatorConfig,
        binder: MockBinder,
    ) -> SimulatorManager<MockBinder, TerminalStatus<Vec<u8>>> {
        SimulatorManager::new(config, binder, TerminalStatus::new(Vec::new(), StatusMode::Append))
            .unwrap()
    }

    #[test]
    fn test_bind_failure_is_never_retried() {
        let (binder, probe) = MockBinder::new(vec![None]);
        let mut manager = manager(config(true), binder);

        let exit = manager.run(&CancellationToken::new());
        assert_eq!(exit, SimulatorExit::BindFailed);
        assert_eq!(exit.exit_code(), 1);
        assert_eq!(manager.state(), SessionState::Failed);
        assert_eq!(manager.restarts(), 0);
        assert_eq!(probe.lock().unwrap().bind_attempts, 1);
    }

    #[test]
    fn test_connection_loss_without_restart_exits_nonzero() {
        let (binder, probe) = MockBinder::new(vec![Some(Some(2))]);
        let mut manager = manager(config(false), binder);

        let exit = manager.run(&CancellationToken::new());
        assert_eq!(exit, SimulatorExit::ConnectionLost);
        assert_eq!(exit.exit_code(), 1);

        let probe = probe.lock().unwrap();
        assert_eq!(probe.bind_attempts, 1);
        assert_eq!(probe.live_transports, 0);
        // Three ticks published before the health check failed
        assert_eq!(probe.reports[0].len(), 3 * 4);
    }

    #[test]
    fn test_auto_restart_rebinds_and_resets_sim_time() {
        let (binder, probe) = MockBinder::new(vec![Some(Some(3)), Some(Some(1)), None]);
        let mut manager = manager(config(true), binder);

        let exit = manager.run(&CancellationToken::new());
        assert_eq!(exit, SimulatorExit::BindFailed);
        assert_eq!(manager.restarts(), 2);

        let probe = probe.lock().unwrap();
        assert_eq!(probe.bind_attempts, 3);
        assert!(!probe.overlapping_bind);
        assert_eq!(probe.live_transports, 0);

        let params = TrajectoryParams::default();
        let start = sample(&params, 0, 0.0).position;
        for session in &probe.reports {
            let first = &session[0];
            assert_eq!(first.name, "uav0");
            assert_eq!(first.position, start);
        }
        // Second tick of the first session is one dt later
        let second = &probe.reports[0][4];
        assert_eq!(second.position, sample(&params, 0, 0.001).position);
    }

    #[test]
    fn test_each_session_spawns_all_trackers() {
        let (binder, probe) = MockBinder::new(vec![Some(Some(0)), Some(Some(0))]);
        let mut manager = manager(config(true), binder);
        manager.run(&CancellationToken::new());

        let probe = probe.lock().unwrap();
        let expected: Vec<String> = (0..4).map(|i| format!("uav{i}")).collect();
        assert_eq!(probe.trackers.len(), 2);
        for names in &probe.trackers {
            assert_eq!(names, &expected);
        }
    }

    #[test]
    fn test_cancel_stops_running_session() {
        let (binder, probe) = MockBinder::new(vec![Some(None)]);
        let mut manager = manager(config(true), binder);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });

        let exit = manager.run(&cancel);
        handle.join().unwrap();

        assert_eq!(exit, SimulatorExit::Cancelled);
        assert_eq!(exit.exit_code(), 0);
        assert_eq!(manager.state(), SessionState::StoppedByUser);
        assert!(manager.sim_time() > 0.0);
        assert_eq!(probe.lock().unwrap().live_transports, 0);
    }

    #[test]
    fn test_cancel_before_start_never_binds() {
        let (binder, probe) = MockBinder::new(vec![Some(None)]);
        let mut manager = manager(config(false), binder);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(manager.run(&cancel), SimulatorExit::Cancelled);
        assert_eq!(probe.lock().unwrap().bind_attempts, 0);
    }

    #[test]
    fn test_status_records_follow_sim_time() {
        let (binder, _probe) = MockBinder::new(vec![Some(Some(10))]);
        let config = SimulatorConfig {
            quiet: false,
            rate_hz: 100.0,
            status_interval_s: 0.05,
            status_tracker: 99,
            ..config(false)
        };
        let mut manager = SimulatorManager::new(
            config,
            binder,
            TerminalStatus::new(Vec::new(), StatusMode::Append),
        )
        .unwrap();
        manager.run(&CancellationToken::new());

        let text = String::from_utf8(manager.status.get_ref().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // First record after the first tick, then every 5 ticks
        assert!(lines.len() >= 2, "{text}");
        assert!(lines[0].contains("Sim time 0.01s"));
        assert!(lines[0].contains("| tracker3 pos="));
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        let (binder, _probe) = MockBinder::new(vec![]);
        let config = SimulatorConfig {
            bind_address: "host:notaport".to_string(),
            ..config(false)
        };
        let result = SimulatorManager::new(
            config,
            binder,
            TerminalStatus::new(Vec::new(), StatusMode::Append),
        );
        assert!(matches!(result, Err(SimulatorError::Config(_))));
    }

    #[test]
    fn test_host_in_bind_address_keeps_port() {
        let (binder, _probe) = MockBinder::new(vec![]);
        let config = SimulatorConfig {
            bind_address: "vrpn:example.org:4000".to_string(),
            ..config(false)
        };
        let manager = manager(config, binder);
        assert_eq!(manager.bind_address(), "0.0.0.0:4000".parse().unwrap());
    }
}
