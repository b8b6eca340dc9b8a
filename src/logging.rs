//! Structured logging setup
//!
//! Installs a `tracing` subscriber with an `EnvFilter` (from `RUST_LOG`,
//! falling back to the configured level) and a JSON or pretty formatter.

use crate::config::LoggingConfig;
use crate::error::{AppError, AppResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for local development
    Pretty,
    /// JSON lines for log aggregation
    Json,
}

impl LogFormat {
    /// Parse "json" or "pretty" (case-insensitive); anything else is JSON
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing/logging
///
/// Returns an error instead of panicking when a global subscriber is
/// already installed, so embedding hosts and tests can call it freely.
pub fn init_tracing(config: &LoggingConfig) -> AppResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match LogFormat::from_str_lossy(&config.format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init(),
    };

    result.map_err(|e| AppError::Logging(e.to_string()))
}
