//! Page host backed by a snapshot file that the page shim keeps rewriting.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use leetpush_core::page::{PageHost, PageSnapshot};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tokio::sync::mpsc;

use crate::error::CliError;

/// Coalescing window for raw file-system events. Page-level debouncing
/// happens in the watcher.
pub const FILE_EVENT_DEBOUNCE: Duration = Duration::from_millis(50);

const MUTATION_QUEUE: usize = 16;

/// Reads the snapshot file on every access; a missing file means the page
/// went away.
#[derive(Debug, Clone)]
pub struct SnapshotFileHost {
    path: PathBuf,
}

impl SnapshotFileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageHost for SnapshotFileHost {
    fn is_attached(&self) -> bool {
        self.path.exists()
    }

    fn snapshot(&mut self) -> PageSnapshot {
        match PageSnapshot::load(&self.path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), error = %error, "Unreadable snapshot");
                PageSnapshot::default()
            }
        }
    }
}

/// Keeps the file watcher alive; dropping it ends the notifications.
pub struct SnapshotWatch {
    _debouncer: Debouncer<RecommendedWatcher>,
}

/// Emit one notification per batch of modifications to `path`.
///
/// The parent directory is watched so that shims replacing the file by
/// rename are seen too. The stream closes once the file is removed.
pub fn watch_file(
    path: &Path,
    debounce: Duration,
) -> Result<(SnapshotWatch, mpsc::Receiver<()>), CliError> {
    let path = path.canonicalize()?;
    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(CliError::Config(format!(
            "cannot watch {}: not a file path",
            path.display()
        )));
    };
    let parent = parent.to_path_buf();
    let file_name = file_name.to_os_string();

    let (sender, receiver) = mpsc::channel(MUTATION_QUEUE);
    let mut forwarder = MutationForwarder {
        path: path.clone(),
        file_name,
        sender: Some(sender),
    };
    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        forwarder.forward(result);
    })?;
    debouncer
        .watcher()
        .watch(&parent, RecursiveMode::NonRecursive)?;
    tracing::debug!(path = %path.display(), "Watching snapshot file");

    Ok((
        SnapshotWatch {
            _debouncer: debouncer,
        },
        receiver,
    ))
}

struct MutationForwarder {
    path: PathBuf,
    file_name: OsString,
    sender: Option<mpsc::Sender<()>>,
}

impl MutationForwarder {
    fn forward(&mut self, result: DebounceEventResult) {
        let events = match result {
            Ok(events) => events,
            Err(error) => {
                tracing::warn!(error = %error, "File watch error");
                return;
            }
        };
        let touched = events
            .iter()
            .any(|event| event.path.file_name() == Some(self.file_name.as_os_str()));
        if !touched {
            return;
        }

        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Snapshot file removed");
            self.sender = None;
            return;
        }
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!("Mutation queue full, dropping notification");
            }
            Err(mpsc::error::TrySendError::Closed(())) => self.sender = None,
        }
    }
}
