//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the ledger
//! configuration from a YAML file.

use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};

use super::types::LedgerConfig;

/// The file read from the configuration directory.
pub const CONFIG_FILE: &str = "ledger.yaml";

/// Loads and provides access to the ledger configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── ledger.yaml   # VAT rate and currency
/// ```
///
/// # Example
///
/// ```no_run
/// use pay_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// println!("VAT rate: {}", loader.config().vat.rate);
/// # Ok::<(), pay_ledger::error::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: LedgerConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// - `ConfigNotFound` if `ledger.yaml` cannot be read
    /// - `ConfigParseError` if it is not valid YAML or fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref().join(CONFIG_FILE);
        let path_str = path.display().to_string();

        let content = fs::read_to_string(&path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config: LedgerConfig =
            serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        Self::validate(&config).map_err(|message| LedgerError::ConfigParseError {
            path: path_str,
            message,
        })?;

        Ok(Self { config })
    }

    fn validate(config: &LedgerConfig) -> Result<(), String> {
        if config.vat.rate < Decimal::ZERO {
            return Err(format!("vat.rate must not be negative, got {}", config.vat.rate));
        }
        if config.currency.code.trim().is_empty() {
            return Err("currency.code must not be empty".to_string());
        }
        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> LedgerConfig {
        self.config
    }
}
