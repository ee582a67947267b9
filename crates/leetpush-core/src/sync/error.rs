//! Failure taxonomy of the sync protocol.

use thiserror::Error;

use super::api::{ApiReply, TransportError};
use crate::config::ConfigError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Hosting credentials not configured. Set your username and access token first.")]
    NotConfigured,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid token. Please check your GitHub personal access token.")]
    InvalidToken,
    #[error(
        "Token does not have permission to {0}. Please ensure your token has the \"repo\" scope."
    )]
    InsufficientScope(String),
    #[error("Repository \"{0}\" not found. Please create it first.")]
    RepositoryMissing(String),
    #[error("Cannot create repository: {0}. The repository name might be invalid.")]
    RepositoryCreation(String),
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl From<TransportError> for SyncError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error.0)
    }
}

impl SyncError {
    /// Map a non-success reply to the error the user can act on.
    ///
    /// `action` completes "Token does not have permission to ..." and
    /// `repository` names the repository a 404 refers to.
    pub fn from_reply(reply: &ApiReply, action: &str, repository: &str) -> Self {
        let message = reply.message();
        match reply.status {
            401 if message.contains("Resource not accessible") => {
                Self::InsufficientScope(action.to_string())
            }
            401 => Self::InvalidToken,
            403 if message.contains("Bad credentials") => Self::InvalidToken,
            403 => Self::InsufficientScope(action.to_string()),
            404 => Self::RepositoryMissing(repository.to_string()),
            status => Self::Api { status, message },
        }
    }
}
