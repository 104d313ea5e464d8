//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{parse_bind_address, BridgeConfig, LinkKind, SimulatorConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::{ConfigKind, ValidateArgs};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    kind: &'static str,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    summary: Vec<(String, String)>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), kind = ?args.kind, "Validating configuration");

    let result = validate_config(args.kind, &args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(kind: ConfigKind, path: &Path) -> ValidationResult {
    let mut result = ValidationResult {
        valid: false,
        kind: match kind {
            ConfigKind::Bridge => "bridge",
            ConfigKind::Simulator => "simulator",
        },
        config_path: path.display().to_string(),
        error: None,
        warnings: Vec::new(),
        summary: Vec::new(),
    };

    if !path.exists() {
        result.error = Some(format!("File not found: {}", path.display()));
        return result;
    }

    let loaded = match kind {
        ConfigKind::Bridge => ConfigLoader::load_from_path::<BridgeConfig>(path)
            .map(|config| (bridge_summary(&config), bridge_warnings(&config))),
        ConfigKind::Simulator => ConfigLoader::load_from_path::<SimulatorConfig>(path)
            .map(|config| (simulator_summary(&config), simulator_warnings(&config))),
    };

    match loaded {
        Ok((summary, warnings)) => {
            result.valid = true;
            result.summary = summary;
            result.warnings = warnings;
        }
        Err(e) => result.error = Some(e.to_string()),
    }
    result
}

fn bridge_summary(config: &BridgeConfig) -> Vec<(String, String)> {
    vec![
        ("Tracker".to_string(), config.tracker_address().to_string()),
        ("Rate".to_string(), format!("{} Hz", config.rate_hz)),
        ("Link".to_string(), format!("{} -> {}", config.link.kind, config.link.target())),
        ("Format".to_string(), format!("{:?}", config.link.format)),
        ("Republish".to_string(), format!("{:?}", config.republish)),
        ("Sink retries".to_string(), config.sink_retries.to_string()),
    ]
}

/// Non-fatal issues
fn bridge_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.source_timeout_ms < 2 * config.poll_period_ms {
        warnings.push(format!(
            "source_timeout_ms ({}) is shorter than two poll periods; the source will flap",
            config.source_timeout_ms
        ));
    }
    if config.link.kind == LinkKind::Serial && config.log_poses && config.rate_hz > 100.0 {
        warnings.push("log_poses at more than 100 Hz produces a lot of output".to_string());
    }

    warnings
}

fn simulator_summary(config: &SimulatorConfig) -> Vec<(String, String)> {
    vec![
        ("Bind".to_string(), config.bind_address.clone()),
        ("Trackers".to_string(), config.tracker_count.to_string()),
        ("Rate".to_string(), format!("{} Hz", config.rate_hz)),
        ("Status".to_string(), format!("every {}s, {:?}", config.status_interval_s, config.status_mode)),
        ("Auto restart".to_string(), config.auto_restart.to_string()),
    ]
}

fn simulator_warnings(config: &SimulatorConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.status_tracker >= config.tracker_count {
        warnings.push(format!(
            "status_tracker {} is out of range; tracker {} will be reported",
            config.status_tracker,
            config.status_tracker_index()
        ));
    }
    if let Ok((addr, true)) = parse_bind_address(&config.bind_address) {
        warnings.push(format!(
            "only the port of '{}' is used; the server listens on {}",
            config.bind_address, addr
        ));
    }
    if config.restart_delay_s < 0.0 || config.status_interval_s < 0.0 {
        warnings.push("negative durations are treated as 0".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {} ({})", result.config_path, result.kind);

        println!();
        for (label, value) in &result.summary {
            println!("  {}: {}", label, value);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {} ({})", result.config_path, result.kind);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
