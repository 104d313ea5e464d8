//! SerialSink - writes encoded messages to a character device

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{ContractError, Pose, PoseSink, WireFormat};
use tracing::{debug, instrument, trace};

use crate::encoding::MessageEncoder;

/// Sink writing to a serial device path
///
/// Line settings (baud, parity) are left to the operating system; the
/// configured baud rate is informational.
pub struct SerialSink {
    name: String,
    device: PathBuf,
    baud_rate: u32,
    file: Option<File>,
    encoder: MessageEncoder,
}

impl SerialSink {
    /// Open `device` for writing (it must already exist)
    #[instrument(name = "serial_sink_open", skip(name, device, encoder), fields(device = %device.display()))]
    pub fn open(
        name: impl Into<String>,
        device: &Path,
        baud_rate: u32,
        encoder: MessageEncoder,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let file = OpenOptions::new().write(true).open(device).map_err(|e| {
            ContractError::sink_connection(&name, format!("{}: {e}", device.display()))
        })?;

        debug!(sink = %name, baud_rate, "SerialSink opened");

        Ok(Self {
            name,
            device: device.to_path_buf(),
            baud_rate,
            file: Some(file),
            encoder,
        })
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl PoseSink for SerialSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn transmit(&mut self, pose: &Pose) -> Result<(), ContractError> {
        let mut data = self.encoder.encode(pose)?;
        // JSON messages are newline-delimited on a byte stream
        if self.encoder.format() == WireFormat::Json {
            data.push(b'\n');
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "device closed"))?;
        file.write_all(&data)
            .and_then(|_| file.flush())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        trace!(sink = %self.name, bytes = data.len(), "message written");
        Ok(())
    }

    #[instrument(name = "serial_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        debug!(sink = %self.name, "SerialSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Quaternion, Vector3};
    use std::io::BufRead;

    #[test]
    fn test_missing_device_is_connection_error() {
        let encoder = MessageEncoder::new(WireFormat::Json, 1, 1);
        let dir = tempfile::tempdir().unwrap();
        let result = SerialSink::open("serial", &dir.path().join("ttyNOPE"), 921_600, encoder);
        assert!(matches!(
            result.err().unwrap(),
            ContractError::SinkConnection { .. }
        ));
    }

    #[test]
    fn test_json_lines_written() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let encoder = MessageEncoder::new(WireFormat::Json, 1, 1);
        let mut sink = SerialSink::open("serial", device.path(), 57_600, encoder).unwrap();
        assert_eq!(sink.baud_rate(), 57_600);

        for t in [1.0, 2.0] {
            let pose = Pose::from_quaternion(t, Vector3::new(t, 0.0, 0.0), Quaternion::IDENTITY);
            sink.transmit(&pose).unwrap();
        }
        sink.close().unwrap();

        let reader = std::io::BufReader::new(File::open(device.path()).unwrap());
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        let second = encoder.decode(lines[1].as_bytes()).unwrap();
        assert_eq!(second.usec, 2_000_000);
    }
}
