//! `bridge` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::BridgeConfig;
use tracing::info;
use tracking::{ClientConfig, UdpTrackerConnector};

use crate::cli::BridgeArgs;
use crate::error::CliError;
use crate::pipeline::Bridge;
use crate::signal::shutdown_signal;

/// Execute the `bridge` command
pub async fn run_bridge(args: &BridgeArgs) -> Result<()> {
    let config = load_config(args)?;

    info!(
        tracker = %config.tracker_address(),
        link = %config.link.kind,
        target = %config.link.target(),
        format = ?config.link.format,
        rate_hz = config.rate_hz,
        "Configuration loaded"
    );

    let sink = dispatcher::create_sink(&config.link, config.log_poses)
        .map_err(|e| CliError::startup(e.to_string()))
        .context("Failed to open outbound link")?;

    let connector = UdpTrackerConnector::new(ClientConfig {
        silence_timeout: config.source_timeout(),
        ..Default::default()
    });

    let stats = Bridge::new(config)
        .run(connector, sink, shutdown_signal())
        .await
        .context("Bridge execution failed")?;

    stats.print_summary();
    info!("Pose relay bridge finished");
    Ok(())
}

/// Defaults, then the optional file, then command-line overrides
pub fn load_config(args: &BridgeArgs) -> Result<BridgeConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::read_raw::<BridgeConfig>(path)?
        }
        None => BridgeConfig::default(),
    };

    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut BridgeConfig, args: &BridgeArgs) {
    if let Some(tracker) = &args.tracker {
        config.tracker = tracker.clone();
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(rate) = args.rate {
        config.rate_hz = rate;
    }
    if let Some(kind) = args.link {
        config.link.kind = kind;
    }
    if let Some(device) = &args.device {
        config.link.serial_device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.link.baud_rate = baud;
    }
    if let Some(target) = &args.udp_target {
        config.link.udp_target = target.clone();
    }
    if let Some(sysid) = args.sysid {
        config.link.system_id = sysid;
    }
    if let Some(compid) = args.compid {
        config.link.component_id = compid;
    }
    if let Some(format) = args.format {
        config.link.format = format.into();
    }
    if let Some(republish) = args.republish {
        config.republish = republish.into();
    }
    if let Some(retries) = args.sink_retries {
        config.sink_retries = retries;
    }
    if args.log_poses {
        config.log_poses = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FormatArg, RepublishArg};
    use contracts::{LinkKind, RepublishPolicy, WireFormat};
    use std::io::Write;

    #[test]
    fn test_defaults_need_a_tracker() {
        let err = load_config(&BridgeArgs::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_command_line_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
tracker = "uav2"
host = "10.0.0.5"
rate_hz = 30.0

[link]
kind = "udp"
udp_target = "127.0.0.1:14550"
"#
        )
        .unwrap();

        let args = BridgeArgs {
            config: Some(file.path().to_path_buf()),
            rate: Some(60.0),
            format: Some(FormatArg::Bincode),
            republish: Some(RepublishArg::EveryTick),
            ..Default::default()
        };
        let config = load_config(&args).unwrap();

        assert_eq!(config.tracker, "uav2");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.rate_hz, 60.0);
        assert_eq!(config.link.kind, LinkKind::Udp);
        assert_eq!(config.link.format, WireFormat::Bincode);
        assert_eq!(config.republish, RepublishPolicy::EveryTick);
    }

    #[test]
    fn test_overrides_are_validated() {
        let args = BridgeArgs {
            tracker: Some("uav0".to_string()),
            link: Some(LinkKind::Serial),
            baud: Some(9600),
            ..Default::default()
        };
        assert!(matches!(load_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let args = BridgeArgs {
            config: Some("/nonexistent/bridge.toml".into()),
            ..Default::default()
        };
        assert!(matches!(
            load_config(&args),
            Err(CliError::ConfigNotFound { .. })
        ));
    }
}
