//! # Pose Relay CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - `bridge`: tracking source -> fixed-rate telemetry link
//! - `simulate`: synthetic tracking server
//! - `validate`: configuration checks

mod cli;
mod commands;
mod error;
mod pipeline;
mod signal;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_bridge, run_simulate, run_validate};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Pose relay starting");

    let result = match &cli.command {
        Commands::Bridge(args) => run_bridge(args).await.map(|()| ExitCode::SUCCESS),
        Commands::Simulate(args) => run_simulate(args, cli.quiet)
            .await
            .map(|exit| ExitCode::from(exit.exit_code())),
        Commands::Validate(args) => run_validate(args).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging (and metrics) based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let (default_log_level, force_level) = if cli.quiet {
        ("warn", true)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, false)
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: default_log_level.to_string(),
        force_level,
    })
}
