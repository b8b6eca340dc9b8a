//! Configuration management for the asset sync engine
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values.

use crate::token::MAX_SCAN_BATCH_SIZE;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Token screening configuration
    #[serde(default)]
    pub screening: ScreeningConfig,
    /// Event bus configuration
    #[serde(default)]
    pub events: EventBusConfig,
    /// Periodic balance refresh
    #[serde(default)]
    pub balances: BalanceRefreshConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Token screening configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScreeningConfig {
    /// Run auto-detected assets through the token safety classifier
    #[serde(default = "default_screening_enabled")]
    pub enabled: bool,
    /// Maximum addresses per classifier call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_screening_enabled() -> bool {
    true
}

fn default_batch_size() -> usize {
    MAX_SCAN_BATCH_SIZE
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            enabled: default_screening_enabled(),
            batch_size: default_batch_size(),
        }
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventBusConfig {
    /// Subscriber notification ring capacity (the dispatcher inbox is unbounded)
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

fn default_bus_capacity() -> usize {
    256
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

/// Periodic balance refresh configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceRefreshConfig {
    /// Seconds between wholesale refreshes; 0 disables the timer
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl BalanceRefreshConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (ASSET_SYNC__*)
    /// 2. config/asset_sync.yaml (if exists)
    /// 3. asset_sync.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::with_name("asset_sync").required(false))
            .add_source(File::with_name("config/asset_sync").required(false))
            // ASSET_SYNC__SCREENING__BATCH_SIZE=50 -> screening.batch_size = 50
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from an explicit file, still honouring environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("screening.enabled", true)?
            .set_default("screening.batch_size", MAX_SCAN_BATCH_SIZE as i64)?
            .set_default("events.capacity", default_bus_capacity() as i64)?
            .set_default("balances.refresh_interval_secs", 0_i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())
    }

    fn environment() -> Environment {
        Environment::with_prefix("ASSET_SYNC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screening.batch_size == 0 || self.screening.batch_size > MAX_SCAN_BATCH_SIZE {
            return Err(ConfigError::Message(format!(
                "screening.batch_size must be between 1 and {}",
                MAX_SCAN_BATCH_SIZE
            )));
        }

        if self.events.capacity == 0 {
            return Err(ConfigError::Message(
                "events.capacity must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ConfigError::Message(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            )));
        }

        Ok(())
    }
}
