//! leetpush-core - Core library for leetpush
//!
//! This crate watches a judge page for accepted submissions, extracts the
//! solution and its language, and syncs it into a GitHub repository.

pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod formatter;
pub mod github;
pub mod language;
pub mod message;
pub mod models;
pub mod page;
pub mod sync;
pub mod util;
pub mod watcher;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{RemoteFile, SubmissionEvent, SubmissionKey};
