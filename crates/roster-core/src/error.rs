//! Error types for the roster sync service
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for roster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the roster sync service
#[derive(Error, Debug)]
pub enum Error {
    /// Directory service errors (fetch failures, API-level errors)
    #[error("Directory error ({directory}): {message}")]
    Directory {
        /// Directory client name
        directory: String,
        /// Error message
        message: String,
    },

    /// Member store errors
    #[error("Member store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication against the directory service failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The directory service asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// An operation did not finish within its time bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A webhook body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A webhook carried the wrong verification token
    #[error("Verification token mismatch")]
    TokenMismatch,

    /// Invalid input (e.g. a member without an id)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a directory error
    pub fn directory(directory: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            directory: directory.into(),
            message: message.into(),
        }
    }

    /// Create a member store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying the same operation later may succeed
    ///
    /// Used for log levels only; the reconciliation loop retries every
    /// failure regardless.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Directory { .. }
                | Self::Store(_)
                | Self::Io(_)
                | Self::RateLimited(_)
                | Self::Timeout(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
