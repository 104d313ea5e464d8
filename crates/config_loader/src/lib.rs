//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce `BridgeConfig` / `SimulatorConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use contracts::BridgeConfig;
//! use std::path::Path;
//!
//! let config: BridgeConfig = ConfigLoader::load_from_path(Path::new("bridge.toml")).unwrap();
//! println!("Tracker: {}", config.tracker_address());
//! ```

mod parser;
mod validator;

pub use contracts::{BridgeConfig, SimulatorConfig};
pub use parser::ConfigFormat;
pub use validator::ValidatedConfig;

use contracts::ContractError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path<T>(path: &Path) -> Result<T, ContractError>
    where
        T: DeserializeOwned + ValidatedConfig,
    {
        let config: T = Self::read_raw(path)?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from file path without validating it
    ///
    /// Used when command-line overrides are applied afterwards; the caller
    /// validates the merged result.
    pub fn read_raw<T: DeserializeOwned>(path: &Path) -> Result<T, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        parser::parse(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str<T>(content: &str, format: ConfigFormat) -> Result<T, ContractError>
    where
        T: DeserializeOwned + ValidatedConfig,
    {
        let config: T = parser::parse(content, format)?;
        config.check()?;
        Ok(config)
    }

    /// Validate an already-built configuration
    pub fn validate<T: ValidatedConfig>(config: &T) -> Result<(), ContractError> {
        config.check()
    }

    /// Serialize a configuration to TOML string
    pub fn to_toml<T: Serialize>(config: &T) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a configuration to JSON string
    pub fn to_json<T: Serialize>(config: &T) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
