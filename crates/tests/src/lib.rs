//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - contracts shared by several crates
//! - configuration files through the loader
//! - loopback e2e: simulator -> tracker client -> cache -> publisher -> sink

#[cfg(test)]
mod contract_tests {
    use std::f64::consts::FRAC_PI_2;

    use contracts::{normalize_host, Pose, Quaternion, TrackerAddress, Vector3};

    #[test]
    fn test_gimbal_lock_never_produces_nan() {
        let half = FRAC_PI_2 * 0.5;
        // Pitch argument lands on exactly +1 / -1 (or a rounding step past it)
        for sign in [1.0, -1.0] {
            let q = Quaternion::new(0.0, sign * half.sin(), 0.0, half.cos());
            let pose = Pose::from_quaternion(0.0, Vector3::default(), q);
            assert!(pose.orientation.pitch.is_finite());
            assert!((pose.orientation.pitch - sign * FRAC_PI_2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_localhost_aliases_share_one_address() {
        for host in ["", "localhost", "::1", "127.0.0.1"] {
            assert_eq!(normalize_host(host), "127.0.0.1");
            let address = TrackerAddress::new("uav0", host, 3883);
            assert_eq!(address.to_string(), "uav0@127.0.0.1:3883");
        }
    }
}

#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use config_loader::{BridgeConfig, ConfigLoader, SimulatorConfig};
    use contracts::{LinkKind, RepublishPolicy, StatusMode, TrajectoryParams};

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_bridge_file_drives_publisher_period() {
        let file = write_config(
            ".toml",
            r#"
tracker = "uav3"
host = "localhost"
port = 3900
rate_hz = 40.0

[link]
kind = "udp"
udp_target = "127.0.0.1:14550"
"#,
        );

        let config: BridgeConfig = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.tracker_address().to_string(), "uav3@127.0.0.1:3900");
        assert_eq!(config.link.kind, LinkKind::Udp);
        assert_eq!(config.republish, RepublishPolicy::OnWrite);
        assert_eq!(config.publish_period().as_millis(), 25);
    }

    #[test]
    fn test_partial_trajectory_keeps_other_defaults() {
        let file = write_config(
            ".json",
            r#"{ "tracker_count": 3, "status_mode": "inline", "trajectory": { "r0": 5.0 } }"#,
        );

        let config: SimulatorConfig = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.tracker_count, 3);
        assert_eq!(config.status_mode, StatusMode::Inline);
        assert_eq!(config.trajectory.r0, 5.0);
        assert_eq!(config.trajectory.z0, TrajectoryParams::default().z0);
        assert_eq!(config.trajectory.w_step, TrajectoryParams::default().w_step);
    }

    #[test]
    fn test_rejected_file_names_the_field() {
        let file = write_config(".toml", "tracker_count = 0\n");
        let err = ConfigLoader::load_from_path::<SimulatorConfig>(file.path()).unwrap_err();
        assert!(err.to_string().contains("tracker_count"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::net::{SocketAddr, UdpSocket};
    use std::sync::{mpsc, Arc};
    use std::thread::{self, JoinHandle};
    use std::time::{Duration, Instant};

    use contracts::{
        CancellationToken, Pose, Quaternion, RepublishPolicy, SimulatorConfig, StatusMode,
        TrackerAddress, Vector3, WireFormat,
    };
    use dispatcher::{
        FixedRatePublisher, MemorySink, MessageEncoder, PublisherConfig, TickOutcome, UdpSink,
    };
    use ingestion::{
        AcquisitionConfig, AcquisitionLoop, PoseCache, ScriptStep, ScriptedConnector, StepOutcome,
    };
    use simulator::{
        SimulatorError, SimulatorExit, SimulatorManager, TerminalStatus, TransportBinder,
        UdpBinder,
    };
    use tracking::{ClientConfig, UdpTrackerConnector, UdpTrackerServer};

    /// Binds like [`UdpBinder`] and reports where the server landed
    struct ReportingBinder {
        inner: UdpBinder,
        bound: mpsc::Sender<SocketAddr>,
    }

    impl TransportBinder for ReportingBinder {
        type Transport = UdpTrackerServer;

        fn bind(&mut self, addr: SocketAddr) -> Result<UdpTrackerServer, SimulatorError> {
            let server = self.inner.bind(addr)?;
            let _ = self.bound.send(server.local_addr());
            Ok(server)
        }
    }

    struct RunningSimulator {
        cancel: CancellationToken,
        handle: JoinHandle<SimulatorExit>,
        port: u16,
    }

    impl RunningSimulator {
        fn start(tracker_count: usize) -> Self {
            let (tx, rx) = mpsc::channel();
            let config = SimulatorConfig {
                bind_address: ":0".to_string(),
                tracker_count,
                rate_hz: 200.0,
                quiet: true,
                status_interval_s: 0.0,
                ..Default::default()
            };
            let binder = ReportingBinder {
                inner: UdpBinder::default(),
                bound: tx,
            };
            let status = TerminalStatus::new(std::io::sink(), StatusMode::Append);
            let mut manager = SimulatorManager::new(config, binder, status).unwrap();

            let cancel = CancellationToken::new();
            let worker_cancel = cancel.clone();
            let handle = thread::spawn(move || manager.run(&worker_cancel));
            let bound = rx.recv_timeout(Duration::from_secs(5)).unwrap();

            Self {
                cancel,
                handle,
                port: bound.port(),
            }
        }

        fn stop(self) -> SimulatorExit {
            self.cancel.cancel();
            self.handle.join().unwrap()
        }
    }

    fn same_angle(a: f64, b: f64) -> bool {
        let d = (a - b).rem_euclid(std::f64::consts::TAU);
        d.min(std::f64::consts::TAU - d) < 1e-6
    }

    /// Simulator -> UDP tracker client -> acquisition -> cache -> publisher -> memory sink
    #[test]
    fn test_e2e_simulator_to_memory_sink() {
        let simulator = RunningSimulator::start(4);

        let cache = Arc::new(PoseCache::new());
        let cancel = CancellationToken::new();

        let acquisition = AcquisitionLoop::new(
            UdpTrackerConnector::new(ClientConfig::default()),
            TrackerAddress::new("uav2", "localhost", simulator.port),
            cache.clone(),
            AcquisitionConfig::new(Duration::from_millis(1), Duration::from_millis(10)),
        );
        let sink = MemorySink::new("memory");
        let received = sink.handle();
        let publisher = FixedRatePublisher::new(
            sink,
            PublisherConfig {
                period: Duration::from_millis(10),
                republish: RepublishPolicy::OnWrite,
                max_sleep: Duration::from_millis(2),
                ..Default::default()
            },
        );

        let acquisition_cancel = cancel.clone();
        let acquisition_thread = thread::spawn(move || acquisition.run(&acquisition_cancel));
        let publisher_cache = cache.clone();
        let publisher_cancel = cancel.clone();
        let publisher_thread =
            thread::spawn(move || publisher.run(&publisher_cache, &publisher_cancel));

        let deadline = Instant::now() + Duration::from_secs(5);
        while received.len() < 10 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        cancel.cancel();
        let acquisition_stats = acquisition_thread.join().unwrap();
        let publisher_stats = publisher_thread.join().unwrap().unwrap();
        assert_eq!(simulator.stop(), SimulatorExit::Cancelled);

        let poses = received.poses();
        assert!(poses.len() >= 10, "only {} poses relayed", poses.len());
        assert!(acquisition_stats.connects >= 1);
        assert_eq!(publisher_stats.published as usize, poses.len());

        // Object 2: radius 2.0 + 0.1*2, height 1.0 + 0.05*2, heading along the angle
        for pose in &poses {
            let p = pose.position;
            assert!((p.x.hypot(p.y) - 2.2).abs() < 1e-6, "radius off: {p:?}");
            assert!((p.z - 1.1).abs() < 1e-6, "height off: {p:?}");
            assert!(same_angle(pose.orientation.yaw, p.y.atan2(p.x)));
            assert!(pose.orientation.roll.abs() < 1e-9);
            assert!(pose.orientation.pitch.abs() < 1e-9);
        }
        assert!(poses.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    /// Publisher -> UDP sink -> a local receiver decoding the wire format
    #[test]
    fn test_e2e_publisher_to_udp_receiver() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let target = receiver.local_addr().unwrap().to_string();

        let encoder = MessageEncoder::new(WireFormat::Json, 7, 9);
        let sink = UdpSink::new("udp", &target, encoder).unwrap();
        let mut publisher = FixedRatePublisher::new(sink, PublisherConfig::default());

        let cache = PoseCache::new();
        cache.write(Pose::from_quaternion(
            2.5,
            Vector3::new(1.0, -2.0, 0.5),
            Quaternion::from_yaw(0.75),
        ));
        assert_eq!(publisher.tick(&cache).unwrap(), TickOutcome::Published);

        let mut buf = [0u8; 2048];
        let len = receiver.recv(&mut buf).unwrap();
        let message = encoder.decode(&buf[..len]).unwrap();

        assert_eq!(message.system_id, 7);
        assert_eq!(message.component_id, 9);
        assert_eq!(message.usec, 2_500_000);
        assert_eq!(message.x, 1.0);
        assert_eq!(message.y, -2.0);
        assert_eq!(message.z, 0.5);
        assert!((message.yaw - 0.75).abs() < 1e-6);
        assert!(message.covariance.iter().all(|c| *c == 0.0));
    }

    /// A dropped source keeps the last pose available until a new one arrives
    #[test]
    fn test_reconnect_keeps_last_pose_published() {
        let first = Pose::from_quaternion(1.0, Vector3::new(1.0, 0.0, 1.0), Quaternion::IDENTITY);
        let second = Pose::from_quaternion(2.0, Vector3::new(2.0, 0.0, 1.0), Quaternion::IDENTITY);

        let connector = ScriptedConnector::new()
            .refuse_first(1)
            .session(vec![ScriptStep::Pose(first), ScriptStep::Drop])
            .session(vec![ScriptStep::Silent, ScriptStep::Pose(second)]);
        let probe = connector.probe();

        let cache = Arc::new(PoseCache::new());
        let mut acquisition = AcquisitionLoop::new(
            connector,
            TrackerAddress::new("uav0", "localhost", 3883),
            cache.clone(),
            AcquisitionConfig::default(),
        );

        let sink = MemorySink::new("memory");
        let received = sink.handle();
        let mut publisher = FixedRatePublisher::new(
            sink,
            PublisherConfig {
                republish: RepublishPolicy::EveryTick,
                ..Default::default()
            },
        );

        assert_eq!(acquisition.step(), StepOutcome::Failed);
        assert_eq!(publisher.tick(&cache).unwrap(), TickOutcome::SkippedEmpty);

        assert_eq!(acquisition.step(), StepOutcome::Wrote);
        assert_eq!(acquisition.step(), StepOutcome::Failed);
        assert!(!acquisition.is_connected());
        assert_eq!(publisher.tick(&cache).unwrap(), TickOutcome::Published);

        // New session, nothing received yet: the stale pose is still relayed
        assert_eq!(acquisition.step(), StepOutcome::NoPose);
        assert_eq!(publisher.tick(&cache).unwrap(), TickOutcome::Published);

        assert_eq!(acquisition.step(), StepOutcome::Wrote);
        assert_eq!(publisher.tick(&cache).unwrap(), TickOutcome::Published);

        assert_eq!(received.poses(), vec![first, first, second]);
        assert_eq!(probe.connects(), 2);
        assert_eq!(probe.refused(), 1);
        assert!(!probe.saw_overlapping_connect());
    }

    #[test]
    fn test_simulator_bind_conflict_exits_without_retry() {
        let occupied = UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = SimulatorConfig {
            bind_address: format!(":{port}"),
            tracker_count: 2,
            quiet: true,
            auto_restart: true,
            restart_delay_s: 0.0,
            ..Default::default()
        };
        let status = TerminalStatus::new(std::io::sink(), StatusMode::Append);
        let mut manager = SimulatorManager::new(config, UdpBinder::default(), status).unwrap();

        let exit = manager.run(&CancellationToken::new());
        assert_eq!(exit, SimulatorExit::BindFailed);
        assert_eq!(exit.exit_code(), 1);
        assert_eq!(manager.restarts(), 0);
    }
}
