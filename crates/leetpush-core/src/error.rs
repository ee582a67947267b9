//! Error types for leetpush-core

use thiserror::Error;

/// Result type alias using leetpush-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the sync protocol
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
