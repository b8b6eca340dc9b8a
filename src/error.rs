//! Error types for the asset sync engine

use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl AppError {
    /// Short machine-readable reason, used as a structured log field
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration_error",
            AppError::Validation(_) => "validation_failed",
            AppError::Logging(_) => "logging_error",
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
