//! Tracking wire format
//!
//! All integers and floats are big-endian.
//!
//! ```text
//! subscribe: "PSUB" | version u8 | name_len u8 | name
//! report:    "PTRK" | version u8 | name_len u8 | name
//!            | timestamp f64 | x y z f64 | qx qy qz qw f64
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::{Pose, Quaternion, Vector3};

use crate::error::TrackingError;

/// Protocol version carried in every datagram
pub const PROTOCOL_VERSION: u8 = 1;

const SUBSCRIBE_MAGIC: &[u8; 4] = b"PSUB";
const REPORT_MAGIC: &[u8; 4] = b"PTRK";
const HEADER_LEN: usize = 6;
const REPORT_BODY_LEN: usize = 8 * 8;

/// One tracker sample as sent by the server
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerReport {
    pub name: String,
    /// Server clock, seconds
    pub timestamp: f64,
    pub position: Vector3,
    pub orientation: Quaternion,
}

impl TrackerReport {
    /// Convert to a pose (quaternion -> Euler happens here, once)
    pub fn to_pose(&self) -> Pose {
        Pose::from_quaternion(self.timestamp, self.position, self.orientation)
    }
}

/// Decoded datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Datagram {
    /// Client asks for reports of `name`
    Subscribe { name: String },
    /// Server sample
    Report(TrackerReport),
}

impl Datagram {
    pub fn encode(&self) -> Result<Bytes, TrackingError> {
        match self {
            Self::Subscribe { name } => encode_subscribe(name),
            Self::Report(report) => encode_report(report),
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackingError> {
        if data.len() < HEADER_LEN {
            return Err(TrackingError::malformed(format!(
                "{} bytes is shorter than the header",
                data.len()
            )));
        }

        let mut buf = data;
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);

        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(TrackingError::UnsupportedVersion { version });
        }

        let name = read_name(&mut buf)?;
        let datagram = match &magic {
            SUBSCRIBE_MAGIC => Self::Subscribe { name },
            REPORT_MAGIC => Self::Report(read_report_body(&mut buf, name)?),
            other => {
                return Err(TrackingError::malformed(format!(
                    "unknown magic {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };

        if buf.has_remaining() {
            return Err(TrackingError::malformed(format!(
                "{} trailing bytes",
                buf.remaining()
            )));
        }
        Ok(datagram)
    }
}

/// Encode a subscribe datagram
pub fn encode_subscribe(name: &str) -> Result<Bytes, TrackingError> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + name.len());
    put_header(&mut buf, SUBSCRIBE_MAGIC, name)?;
    Ok(buf.freeze())
}

/// Encode a report datagram
pub fn encode_report(report: &TrackerReport) -> Result<Bytes, TrackingError> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + report.name.len() + REPORT_BODY_LEN);
    put_header(&mut buf, REPORT_MAGIC, &report.name)?;
    buf.put_f64(report.timestamp);
    buf.put_f64(report.position.x);
    buf.put_f64(report.position.y);
    buf.put_f64(report.position.z);
    buf.put_f64(report.orientation.x);
    buf.put_f64(report.orientation.y);
    buf.put_f64(report.orientation.z);
    buf.put_f64(report.orientation.w);
    Ok(buf.freeze())
}

fn put_header(buf: &mut BytesMut, magic: &[u8; 4], name: &str) -> Result<(), TrackingError> {
    let len = u8::try_from(name.len()).map_err(|_| TrackingError::NameTooLong {
        name: name.to_string(),
        len: name.len(),
    })?;
    buf.put_slice(magic);
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(len);
    buf.put_slice(name.as_bytes());
    Ok(())
}

fn read_name(buf: &mut &[u8]) -> Result<String, TrackingError> {
    let len = usize::from(buf.get_u8());
    if buf.remaining() < len {
        return Err(TrackingError::malformed(format!(
            "name needs {len} bytes, {} left",
            buf.remaining()
        )));
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec())
        .map_err(|e| TrackingError::malformed(format!("name is not utf-8: {e}")))
}

fn read_report_body(buf: &mut &[u8], name: String) -> Result<TrackerReport, TrackingError> {
    if buf.remaining() < REPORT_BODY_LEN {
        return Err(TrackingError::malformed(format!(
            "report body needs {REPORT_BODY_LEN} bytes, {} left",
            buf.remaining()
        )));
    }
    let timestamp = buf.get_f64();
    let position = Vector3::new(buf.get_f64(), buf.get_f64(), buf.get_f64());
    let orientation = Quaternion::new(buf.get_f64(), buf.get_f64(), buf.get_f64(), buf.get_f64());
    Ok(TrackerReport {
        name,
        timestamp,
        position,
        orientation,
    })
}
