//! Error types for the habit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for habit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A habit or entry failed domain validation
    #[error("Invalid {what}: {reason}")]
    Validation { what: &'static str, reason: String },

    /// A referenced habit does not exist
    #[error("Habit not found: {0}")]
    NotFound(String),

    /// The data file exists but cannot be parsed
    #[error("Data file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn validation(what: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            what,
            reason: reason.into(),
        }
    }
}
