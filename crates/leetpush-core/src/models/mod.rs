//! Data models for leetpush

mod remote_file;
mod submission;

pub use remote_file::RemoteFile;
pub use submission::{SubmissionEvent, SubmissionKey};
