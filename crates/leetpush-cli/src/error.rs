use std::io;

use leetpush_core::config::ConfigError;
use leetpush_core::sync::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] leetpush_core::Error),
    #[error(transparent)]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] TransportError),
    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not configured. Run `leetpush config init --username <NAME>` first.")]
    NotConfigured,
    #[error("Problem slug cannot be empty")]
    EmptyProblem,
    #[error("Solution file is empty: {0}")]
    EmptySolution(String),
    #[error("Push did not complete")]
    PushFailed,
    #[error("Connection test failed: {0}")]
    ConnectionFailed(String),
    #[error("Background task failed: {0}")]
    Task(String),
}
