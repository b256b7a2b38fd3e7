//! Error types for the setlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for setlog_core operations
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

    /// Structurally invalid plan (bad grid shape, unknown workout letter, ...)
    #[error("Plan validation error: {0}")]
    PlanValidation(String),

    /// Rejected user input (non-numeric or non-positive rep/duration value)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Event not allowed in the current session phase
    #[error("Session error: {0}")]
    Session(String),

    /// Repository lookup or persistence failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
