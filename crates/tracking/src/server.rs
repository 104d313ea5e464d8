//! UDP tracker server - fans reports out to subscribed clients

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace, warn};

use crate::codec::{encode_report, Datagram, TrackerReport};
use crate::error::TrackingError;

const RECV_BUFFER_LEN: usize = 512;

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Subscriptions not refreshed within this window are dropped
    pub subscription_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            subscription_ttl: Duration::from_secs(5),
        }
    }
}

/// Non-blocking report server
///
/// A fatal socket error flips [`is_healthy`](Self::is_healthy) to false;
/// the owner decides whether to rebind.
#[derive(Debug)]
pub struct UdpTrackerServer {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: ServerConfig,
    trackers: HashSet<String>,
    subscriptions: HashMap<(SocketAddr, String), Instant>,
    healthy: bool,
    buf: Vec<u8>,
}

impl UdpTrackerServer {
    /// Bind at `addr`
    #[instrument(name = "tracker_server_bind", skip(config))]
    pub fn bind(addr: SocketAddr, config: ServerConfig) -> Result<Self, TrackingError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        info!(addr = %local_addr, "tracker server listening");

        Ok(Self {
            socket,
            local_addr,
            config,
            trackers: HashSet::new(),
            subscriptions: HashMap::new(),
            healthy: true,
            buf: vec![0u8; RECV_BUFFER_LEN],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Announce a tracker name served by this instance
    pub fn add_tracker(&mut self, name: &str) {
        self.trackers.insert(name.to_string());
    }

    pub fn tracker_count(&self) -> usize {
        self.trackers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handle pending subscriptions and expire stale ones
    pub fn service(&mut self) {
        self.service_at(Instant::now());
    }

    fn service_at(&mut self, now: Instant) {
        while self.healthy {
            match self.socket.recv_from(&mut self.buf) {
                Ok((len, peer)) => self.handle_datagram(len, peer, now),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if is_transient_error(e.kind()) => {
                    trace!(error = %e, "peer error on receive");
                }
                Err(e) => self.mark_unhealthy(&e),
            }
        }

        let ttl = self.config.subscription_ttl;
        self.subscriptions.retain(|(peer, name), last_seen| {
            let alive = now.duration_since(*last_seen) <= ttl;
            if !alive {
                debug!(peer = %peer, tracker = %name, "subscription expired");
            }
            alive
        });
    }

    fn handle_datagram(&mut self, len: usize, peer: SocketAddr, now: Instant) {
        match Datagram::decode(&self.buf[..len]) {
            Ok(Datagram::Subscribe { name }) => {
                if !self.trackers.contains(&name) {
                    debug!(peer = %peer, tracker = %name, "subscription for unknown tracker");
                }
                if self.subscriptions.insert((peer, name.clone()), now).is_none() {
                    info!(peer = %peer, tracker = %name, "client subscribed");
                }
            }
            Ok(Datagram::Report(_)) => trace!(peer = %peer, "ignoring report from client"),
            Err(e) => trace!(peer = %peer, error = %e, "ignoring datagram"),
        }
    }

    /// Send `report` to every peer subscribed to its name
    pub fn send_report(&mut self, report: &TrackerReport) -> Result<(), TrackingError> {
        if !self.healthy {
            return Ok(());
        }
        let data = encode_report(report)?;

        let mut refused = Vec::new();
        for (peer, name) in self.subscriptions.keys() {
            if name != &report.name {
                continue;
            }
            match self.socket.send_to(&data, peer) {
                Ok(_) => {}
                // Datagram dropped; the next tick sends a fresher one
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) if is_transient_error(e.kind()) => refused.push((*peer, name.clone())),
                Err(e) => {
                    warn!(error = %e, "tracker server send failed");
                    self.healthy = false;
                    break;
                }
            }
        }

        for key in refused {
            debug!(peer = %key.0, tracker = %key.1, "dropping refused subscriber");
            self.subscriptions.remove(&key);
        }
        Ok(())
    }

    fn mark_unhealthy(&mut self, error: &std::io::Error) {
        warn!(addr = %self.local_addr, error = %error, "tracker server socket failed");
        self.healthy = false;
    }
}

fn is_transient_error(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}
