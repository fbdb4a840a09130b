//! Application-level error types.
//!
//! Feature crates carry their own error enums (see `vana_events::EventsError`);
//! these cover startup concerns shared by the binary.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for printing to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message, free of internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}
