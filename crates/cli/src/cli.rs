//! CLI argument definitions using clap.
//!
//! Every run option is optional here: values given on the command line
//! override the configuration file, which overrides the built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{LinkKind, RepublishPolicy, StatusMode, WireFormat};

/// Pose Relay - motion-tracking to telemetry bridge and tracker simulator
#[derive(Parser, Debug)]
#[command(
    name = "pose-relay",
    author,
    version,
    about = "Relay tracked poses to a telemetry link at a fixed rate",
    long_about = "Relays the latest pose of one tracked object from a tracking server to an\n\
                  outbound telemetry link (serial or UDP) at a fixed rate, and ships a\n\
                  synthetic tracking server for testing without tracking hardware."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "POSE_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Only log warnings and errors; `simulate` also stops printing status lines
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "POSE_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "POSE_RELAY_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow one tracker and forward its pose to the telemetry link
    Bridge(BridgeArgs),

    /// Run the synthetic tracking server
    Simulate(SimulateArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `bridge` command
#[derive(Args, Debug, Clone, Default)]
pub struct BridgeArgs {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "POSE_RELAY_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tracker name on the tracking server (required here or in the file)
    #[arg(short, long, env = "POSE_RELAY_TRACKER")]
    pub tracker: Option<String>,

    /// Tracking server host [default: 127.0.0.1]
    #[arg(long, env = "POSE_RELAY_HOST")]
    pub host: Option<String>,

    /// Tracking server port [default: 3883]
    #[arg(long, env = "POSE_RELAY_PORT")]
    pub port: Option<u16>,

    /// Publish rate in Hz [default: 50]
    #[arg(short, long)]
    pub rate: Option<f64>,

    /// Outbound link: serial or udp [default: serial]
    #[arg(long)]
    pub link: Option<LinkKind>,

    /// Serial device [default: /dev/ttyUSB0]
    #[arg(long)]
    pub device: Option<PathBuf>,

    /// Serial baud rate [default: 921600]
    #[arg(long)]
    pub baud: Option<u32>,

    /// UDP target host:port [default: 127.0.0.1:14550]
    #[arg(long)]
    pub udp_target: Option<String>,

    /// Telemetry system id [default: 1]
    #[arg(long)]
    pub sysid: Option<u8>,

    /// Telemetry component id [default: 1]
    #[arg(long)]
    pub compid: Option<u8>,

    /// Outbound wire format [default: json]
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Which cached poses get forwarded [default: on-write]
    #[arg(long, value_enum)]
    pub republish: Option<RepublishArg>,

    /// Extra transmit attempts before a sink failure is fatal [default: 0]
    #[arg(long)]
    pub sink_retries: Option<u32>,

    /// Log every forwarded pose
    #[arg(long)]
    pub log_poses: bool,
}

/// Arguments for the `simulate` command
#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "POSE_RELAY_SIMULATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address (`:port`, `host:port` or `vrpn:host:port`) [default: :3883]
    #[arg(short, long, env = "POSE_RELAY_BIND")]
    pub bind: Option<String>,

    /// Number of simulated trackers [default: 32]
    #[arg(short = 'n', long)]
    pub num_trackers: Option<usize>,

    /// Publish rate in Hz [default: 50]
    #[arg(short, long)]
    pub rate: Option<f64>,

    /// Simulated seconds between status lines, 0 disables [default: 5]
    #[arg(long)]
    pub status_interval: Option<f64>,

    /// Status line mode [default: append]
    #[arg(long, value_enum)]
    pub status_mode: Option<StatusModeArg>,

    /// Include a tracker pose in status lines (default)
    #[arg(long, conflicts_with = "status_no_pose")]
    pub status_pose: bool,

    /// Leave the tracker pose out of status lines
    #[arg(long)]
    pub status_no_pose: bool,

    /// Tracker whose pose is shown in status lines [default: 0]
    #[arg(long)]
    pub status_tracker: Option<usize>,

    /// Rebind after a transport failure instead of exiting
    #[arg(long)]
    pub auto_restart: bool,

    /// Seconds to wait before rebinding [default: 1]
    #[arg(long)]
    pub restart_delay: Option<f64>,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Which configuration the file holds
    #[arg(short, long, value_enum)]
    pub kind: ConfigKind,

    /// Path to configuration file to validate
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Configuration file kinds
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKind {
    Bridge,
    Simulator,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Outbound wire format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Bincode,
}

impl From<FormatArg> for WireFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => Self::Json,
            FormatArg::Bincode => Self::Bincode,
        }
    }
}

/// Republish policy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepublishArg {
    /// Forward a pose only once per cache write
    OnWrite,
    /// Forward the cached pose at every tick
    EveryTick,
}

impl From<RepublishArg> for RepublishPolicy {
    fn from(policy: RepublishArg) -> Self {
        match policy {
            RepublishArg::OnWrite => Self::OnWrite,
            RepublishArg::EveryTick => Self::EveryTick,
        }
    }
}

/// Status line mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusModeArg {
    /// One line per record
    Append,
    /// Overwrite the current line
    Inline,
}

impl From<StatusModeArg> for StatusMode {
    fn from(mode: StatusModeArg) -> Self {
        match mode {
            StatusModeArg::Append => Self::Append,
            StatusModeArg::Inline => Self::Inline,
        }
    }
}
