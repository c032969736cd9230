//! Error types for the RBL check engine
//!
//! Every failure of a single (target, provider) check is local: the engine
//! folds it into a `CheckOutcome` error string and keeps going. The variants
//! here surface at the API boundary, configuration problems and sink
//! failures, never as run-level aborts for one bad provider.

use thiserror::Error;

/// Result type alias for RBL check operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the RBL check engine
#[derive(Error, Debug)]
pub enum Error {
    /// Result sink failure (recording an outcome or run record)
    #[error("Result sink error: {0}")]
    Sink(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
