//! Transport seam between the lifecycle manager and the network

use std::net::SocketAddr;

use tracing::instrument;
use tracking::{ServerConfig, TrackerReport, UdpTrackerServer};

use crate::error::SimulatorError;

/// A bound transport serving tracker reports
pub trait TrackerTransport {
    /// Register a tracker name served by this transport
    fn add_tracker(&mut self, name: &str);

    /// Publish one report
    fn report(&mut self, report: &TrackerReport) -> Result<(), SimulatorError>;

    /// Process pending network input
    fn service(&mut self);

    /// False once the transport can no longer serve clients
    fn is_healthy(&self) -> bool;

    /// Number of active subscriptions, when the transport tracks them
    fn subscriber_count(&self) -> usize {
        0
    }
}

/// Creates transports; a bind failure is final for the current run
pub trait TransportBinder {
    type Transport: TrackerTransport;

    fn bind(&mut self, addr: SocketAddr) -> Result<Self::Transport, SimulatorError>;
}

impl TrackerTransport for UdpTrackerServer {
    fn add_tracker(&mut self, name: &str) {
        UdpTrackerServer::add_tracker(self, name);
    }

    fn report(&mut self, report: &TrackerReport) -> Result<(), SimulatorError> {
        self.send_report(report)?;
        Ok(())
    }

    fn service(&mut self) {
        UdpTrackerServer::service(self);
    }

    fn is_healthy(&self) -> bool {
        UdpTrackerServer::is_healthy(self)
    }

    fn subscriber_count(&self) -> usize {
        UdpTrackerServer::subscriber_count(self)
    }
}

/// Binds [`UdpTrackerServer`]s
#[derive(Debug, Clone, Default)]
pub struct UdpBinder {
    config: ServerConfig,
}

impl UdpBinder {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

impl TransportBinder for UdpBinder {
    type Transport = UdpTrackerServer;

    #[instrument(name = "udp_binder_bind", skip(self))]
    fn bind(&mut self, addr: SocketAddr) -> Result<Self::Transport, SimulatorError> {
        UdpTrackerServer::bind(addr, self.config.clone())
            .map_err(|e| SimulatorError::bind(addr, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_binder_reports_conflict_as_bind_error() {
        let mut binder = UdpBinder::default();
        let first = binder.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let taken = first.local_addr();

        match binder.bind(taken) {
            Err(SimulatorError::Bind { address, .. }) => assert_eq!(address, taken),
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[test]
    fn test_udp_transport_starts_healthy() {
        let mut server = UdpBinder::default()
            .bind("127.0.0.1:0".parse().unwrap())
            .unwrap();
        TrackerTransport::add_tracker(&mut server, "uav0");
        TrackerTransport::service(&mut server);
        assert!(TrackerTransport::is_healthy(&server));
        assert_eq!(TrackerTransport::subscriber_count(&server), 0);
    }
}
