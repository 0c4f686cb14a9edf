//! Unified error type hierarchy for the session validity engine
//!
//! The analyzers themselves never fail: every response set has a defined result.
//! Errors only arise at the edges: loading configuration, reading session files,
//! and recording reviewer overrides.

use std::io;
use thiserror::Error;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Failed to serialize config as TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Session input (response file) errors.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Session file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in session file: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Session contains no response records")]
    EmptySession,

    #[error("IO error while reading session: {0}")]
    IoError(#[from] io::Error),
}

/// Global error type for the crate.
///
/// Wraps the per-concern errors and adds the few invalid-argument cases raised by
/// the review surface.
#[derive(Error, Debug)]
pub enum ValidityError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    /// Invalid argument (e.g. an override without a reason)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Log sink could not be set up
    #[error("Logging error: {0}")]
    Logging(String),
}

impl ValidityError {
    /// Get a user-facing error message suitable for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ValidityError::Config(ConfigError::FileNotFound(path)) => {
                format!("No validity configuration at {}", path)
            }
            ValidityError::Config(e) => format!("Validity configuration error: {}", e),
            ValidityError::Input(InputError::EmptySession) => {
                "The session has no responses to assess".to_string()
            }
            ValidityError::Input(e) => format!("Could not read session responses: {}", e),
            ValidityError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            ValidityError::Logging(msg) => format!("Could not start logging: {}", msg),
        }
    }
}

/// Top-level result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, ValidityError>;
