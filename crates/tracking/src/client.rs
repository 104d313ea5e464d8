//! UDP tracker client - pose source for the acquisition loop

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{ContractError, Pose, PoseSource, PoseSourceConnector, TrackerAddress};
use tracing::{debug, instrument, trace};

use crate::codec::{encode_subscribe, Datagram};

/// Largest datagram we expect (header + 255-byte name + body)
const RECV_BUFFER_LEN: usize = 512;

/// Client timing
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Subscriptions are refreshed at this interval
    pub resubscribe_interval: Duration,
    /// Silence after the first report that marks the connection dead
    pub silence_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            resubscribe_interval: Duration::from_millis(500),
            silence_timeout: Duration::from_secs(1),
        }
    }
}

/// Creates [`UdpTrackerClient`] handles
#[derive(Debug, Clone, Default)]
pub struct UdpTrackerConnector {
    config: ClientConfig,
}

impl UdpTrackerConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl PoseSourceConnector for UdpTrackerConnector {
    type Source = UdpTrackerClient;

    #[instrument(name = "tracker_connect", skip(self, address), fields(tracker = %address))]
    fn connect(&mut self, address: &TrackerAddress) -> Result<Self::Source, ContractError> {
        let server = address.socket_addr()?;
        UdpTrackerClient::connect(&address.name, server, self.config.clone())
            .map_err(|e| ContractError::source_connection(address.to_string(), e.to_string()))
    }
}

/// Subscribed, non-blocking client socket
///
/// The socket is connected to the server so that ICMP refusals surface as
/// errors on the next send or receive.
#[derive(Debug)]
pub struct UdpTrackerClient {
    socket: UdpSocket,
    name: String,
    subscribe: Bytes,
    config: ClientConfig,
    last_subscribe: Instant,
    last_report: Option<Instant>,
    latest: Option<Pose>,
    buf: Vec<u8>,
}

impl UdpTrackerClient {
    /// Bind an ephemeral socket, connect it to `server` and subscribe
    pub fn connect(name: &str, server: SocketAddr, config: ClientConfig) -> std::io::Result<Self> {
        let subscribe = encode_subscribe(name)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;

        let local: SocketAddr = if server.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(server)?;
        socket.set_nonblocking(true)?;
        socket.send(&subscribe)?;

        debug!(tracker = name, server = %server, "subscribed");

        Ok(Self {
            socket,
            name: name.to_string(),
            subscribe,
            config,
            last_subscribe: Instant::now(),
            last_report: None,
            latest: None,
            buf: vec![0u8; RECV_BUFFER_LEN],
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn refresh_subscription(&mut self, now: Instant) -> std::io::Result<()> {
        if now.duration_since(self.last_subscribe) >= self.config.resubscribe_interval {
            self.socket.send(&self.subscribe)?;
            self.last_subscribe = now;
        }
        Ok(())
    }

    /// Read every pending datagram, keeping the newest report for our name
    fn drain(&mut self, now: Instant) -> std::io::Result<()> {
        loop {
            match self.socket.recv(&mut self.buf) {
                Ok(len) => match Datagram::decode(&self.buf[..len]) {
                    Ok(Datagram::Report(report)) if report.name == self.name => {
                        self.latest = Some(report.to_pose());
                        self.last_report = Some(now);
                    }
                    Ok(_) => {}
                    Err(e) => trace!(error = %e, "ignoring datagram"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl PoseSource for UdpTrackerClient {
    fn poll_once(&mut self) -> bool {
        let now = Instant::now();
        if let Err(e) = self.refresh_subscription(now).and_then(|_| self.drain(now)) {
            debug!(tracker = %self.name, error = %e, "tracker socket error");
            return false;
        }

        if let Some(last) = self.last_report {
            if now.duration_since(last) > self.config.silence_timeout {
                debug!(tracker = %self.name, "tracker went silent");
                return false;
            }
        }
        true
    }

    fn latest_pose(&self) -> Option<Pose> {
        self.latest
    }
}
