//! Error types for admission control.

use thiserror::Error;

/// Main error type for admission operations.
///
/// A denied request is not an error; it is reported through
/// [`Decision`](crate::ratelimit::Decision).
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// A rate limit config that can never be enforced (zero window or zero max)
    #[error("Invalid rate limit config: {0}")]
    InvalidConfig(String),

    /// Configuration file or document errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No rule for the route and no default rule
    #[error("No rate limit rule for route '{0}'")]
    UnknownRoute(String),

    /// A background task ended abnormally
    #[error("Background task failed: {0}")]
    Task(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for admission operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;
