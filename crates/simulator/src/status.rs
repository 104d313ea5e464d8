//! Status records and their terminal rendering

use std::fmt;
use std::io::{self, Stdout, Write};

use chrono::Utc;
use contracts::{Quaternion, StatusMode, Vector3};

/// Current unix time in seconds
pub fn unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

/// Pose embedded in a status record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusPose {
    pub tracker: usize,
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// One periodic status snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    /// Wall clock (unix seconds)
    pub unix_time: f64,
    /// Simulated time (seconds)
    pub sim_time: f64,
    pub trackers: usize,
    /// Configured status interval (seconds)
    pub interval_s: f64,
    pub pose: Option<StatusPose>,
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}] Sim time {:.2}s | trackers: {} | interval {:.1}s",
            self.unix_time, self.sim_time, self.trackers, self.interval_s
        )?;
        if let Some(pose) = &self.pose {
            let p = pose.position;
            let q = pose.orientation;
            write!(
                f,
                " | tracker{} pos=({:.2}, {:.2}, {:.2}) quat=({:.3}, {:.3}, {:.3}, {:.3})",
                pose.tracker, p.x, p.y, p.z, q.x, q.y, q.z, q.w
            )?;
        }
        Ok(())
    }
}

/// Destination for status records
pub trait StatusSink {
    fn emit(&mut self, record: &StatusRecord) -> io::Result<()>;

    /// Called once when the simulator exits
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn emit(&mut self, record: &StatusRecord) -> io::Result<()> {
        (**self).emit(record)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Writes records as text lines, appended or overwritten in place
#[derive(Debug)]
pub struct TerminalStatus<W: Write> {
    out: W,
    mode: StatusMode,
    line_open: bool,
}

impl TerminalStatus<Stdout> {
    pub fn stdout(mode: StatusMode) -> Self {
        Self::new(io::stdout(), mode)
    }
}

impl<W: Write> TerminalStatus<W> {
    pub fn new(out: W, mode: StatusMode) -> Self {
        Self {
            out,
            mode,
            line_open: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for TerminalStatus<W> {
    fn emit(&mut self, record: &StatusRecord) -> io::Result<()> {
        match self.mode {
            StatusMode::Append => writeln!(self.out, "{record}")?,
            StatusMode::Inline => {
                write!(self.out, "\r{record}")?;
                self.line_open = true;
            }
        }
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        self.out.flush()
    }
}
