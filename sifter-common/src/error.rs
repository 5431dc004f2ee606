//! Common error types for sifter

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for sifter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the sifter crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed line in a dataset file
    #[error("Parse error in {} line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Record index outside `0..total`
    #[error("Index {index} out of range (total {total})")]
    OutOfRange { index: i64, total: usize },

    /// Score value outside 1..=5
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// Job name that does not resolve to a single directory
    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    /// Font preflight failure
    #[error("Font '{font}' unavailable: {reason}")]
    FontUnavailable { font: String, reason: String },

    /// HTTP transport failure (client side)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
