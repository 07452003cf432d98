//! Error handling module for the suite runner
//!
//! Provides centralized error types using thiserror. Playbook failures are
//! not errors: they are recorded as `PlaybookResult` values. These variants
//! cover the things that stop a unit of work before a process is launched.

use thiserror::Error;

/// Main error type for the suite runner and environment tools
#[derive(Error, Debug)]
pub enum RunnerError {
    /// IO errors (file operations, pipes, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors (paths, environment overrides)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Suite definition file does not exist
    #[error("Test suite not found: {0}")]
    SuiteNotFound(String),

    /// Suite definition exists but cannot be parsed
    #[error("Invalid JSON in {id}: {reason}")]
    InvalidSuite { id: String, reason: String },

    /// Report rendering or persistence errors
    #[error("Report error: {0}")]
    Report(String),

    /// Environment store errors
    #[error("Environment store error: {0}")]
    Store(String),
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

impl RunnerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a report error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Create an environment store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<askama::Error> for RunnerError {
    fn from(err: askama::Error) -> Self {
        RunnerError::Report(err.to_string())
    }
}
