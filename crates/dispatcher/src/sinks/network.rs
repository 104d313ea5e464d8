//! UdpSink - fire-and-forget datagrams to a fixed target

use std::net::{SocketAddr, UdpSocket};

use contracts::{ContractError, Pose, PoseSink};
use tracing::{debug, instrument, trace};

use crate::encoding::MessageEncoder;

/// Sink that sends one datagram per pose
///
/// The socket stays unconnected, so ICMP errors from a missing receiver are
/// not reported back as send failures.
pub struct UdpSink {
    name: String,
    target: SocketAddr,
    socket: Option<UdpSocket>,
    encoder: MessageEncoder,
}

impl UdpSink {
    /// Bind an ephemeral socket for `target` (`host:port` literal)
    #[instrument(name = "udp_sink_new", skip(name, encoder))]
    pub fn new(
        name: impl Into<String>,
        target: &str,
        encoder: MessageEncoder,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let target: SocketAddr = target.parse().map_err(|e| {
            ContractError::config_validation(
                "link.udp_target",
                format!("invalid UDP target '{target}': {e}"),
            )
        })?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        debug!(sink = %name, target = %target, "UdpSink ready");

        Ok(Self {
            name,
            target,
            socket: Some(socket),
            encoder,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket closed"))
    }
}

impl PoseSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError> {
        let data = self.encoder.encode(pose)?;
        let sent = self
            .socket()?
            .send_to(&data, self.target)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        trace!(sink = %self.name, bytes = sent, "datagram sent");
        Ok(())
    }

    #[instrument(name = "udp_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "UdpSink closed");
        Ok(())
    }
}
