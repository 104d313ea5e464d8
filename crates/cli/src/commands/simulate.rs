//! `simulate` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{CancellationToken, SimulatorConfig};
use simulator::{SimulatorExit, SimulatorManager, TerminalStatus, UdpBinder};
use tracing::{info, warn};

use crate::cli::SimulateArgs;
use crate::error::CliError;
use crate::signal::shutdown_signal;

/// Execute the `simulate` command
///
/// The state machine runs on a blocking thread; this task only forwards
/// the shutdown signal to it.
pub async fn run_simulate(args: &SimulateArgs, quiet: bool) -> Result<SimulatorExit> {
    let config = load_config(args, quiet)?;

    info!(
        bind = %config.bind_address,
        trackers = config.tracker_count,
        rate_hz = config.rate_hz,
        auto_restart = config.auto_restart,
        "Configuration loaded"
    );

    let status = TerminalStatus::stdout(config.status_mode);
    let mut manager = SimulatorManager::new(config, UdpBinder::default(), status)
        .context("Failed to prepare simulator")?;

    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || manager.run(&worker_cancel));

    let exit = tokio::select! {
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping simulator...");
            cancel.cancel();
            (&mut worker).await
        }
        exit = &mut worker => exit,
    }
    .context("Simulator task failed")?;

    info!(exit = ?exit, code = exit.exit_code(), "Simulator finished");
    Ok(exit)
}

/// Defaults, then the optional file, then command-line overrides
pub fn load_config(args: &SimulateArgs, quiet: bool) -> Result<SimulatorConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::read_raw::<SimulatorConfig>(path)?
        }
        None => SimulatorConfig::default(),
    };

    apply_overrides(&mut config, args, quiet);
    ConfigLoader::validate(&config)?;
    Ok(config.normalized())
}

fn apply_overrides(config: &mut SimulatorConfig, args: &SimulateArgs, quiet: bool) {
    if let Some(bind) = &args.bind {
        config.bind_address = bind.clone();
    }
    if let Some(count) = args.num_trackers {
        config.tracker_count = count;
    }
    if let Some(rate) = args.rate {
        config.rate_hz = rate;
    }
    if quiet {
        config.quiet = true;
    }
    if let Some(interval) = args.status_interval {
        config.status_interval_s = interval;
    }
    if let Some(mode) = args.status_mode {
        config.status_mode = mode.into();
    }
    if args.status_pose {
        config.status_include_pose = true;
    }
    if args.status_no_pose {
        config.status_include_pose = false;
    }
    if let Some(tracker) = args.status_tracker {
        config.status_tracker = tracker;
    }
    if args.auto_restart {
        config.auto_restart = true;
    }
    if let Some(delay) = args.restart_delay {
        config.restart_delay_s = delay;
    }
}
