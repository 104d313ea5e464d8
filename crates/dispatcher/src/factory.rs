//! Sink construction from link configuration

use contracts::{LinkConfig, LinkKind, PoseSink};
use tracing::{info, instrument};

use crate::encoding::MessageEncoder;
use crate::error::DispatcherError;
use crate::sinks::{LoggingSink, SerialSink, UdpSink};

/// Build the outbound sink for `link`
///
/// With `log_poses` the sink is wrapped in a [`LoggingSink`].
#[instrument(
    name = "dispatcher_create_sink",
    skip(link),
    fields(kind = %link.kind, target = %link.target())
)]
pub fn create_sink(
    link: &LinkConfig,
    log_poses: bool,
) -> Result<Box<dyn PoseSink>, DispatcherError> {
    let encoder = MessageEncoder::from_link(link);
    let name = link.kind.to_string();

    let sink: Box<dyn PoseSink> = match link.kind {
        LinkKind::Serial => Box::new(
            SerialSink::open(&name, &link.serial_device, link.baud_rate, encoder)
                .map_err(|e| DispatcherError::sink_creation(&name, e.to_string()))?,
        ),
        LinkKind::Udp => Box::new(
            UdpSink::new(&name, &link.udp_target, encoder)
                .map_err(|e| DispatcherError::sink_creation(&name, e.to_string()))?,
        ),
    };

    info!(
        sink = %name,
        format = ?link.format,
        system_id = link.system_id,
        component_id = link.component_id,
        "outbound link opened"
    );

    if log_poses {
        Ok(Box::new(LoggingSink::new(sink)))
    } else {
        Ok(sink)
    }
}
