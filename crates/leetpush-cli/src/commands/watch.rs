use std::path::Path;
use std::time::Duration;

use leetpush_core::message;
use leetpush_core::watcher::{Watcher, WatcherConfig};

use crate::commands::common::{build_sync_service, load_config};
use crate::error::CliError;
use crate::snapshot_host::{watch_file, SnapshotFileHost, FILE_EVENT_DEBOUNCE};

const BACKEND_QUEUE: usize = 8;

pub async fn run_watch(config_path: &Path, snapshot: &Path, poll_ms: u64) -> Result<(), CliError> {
    if !snapshot.exists() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("snapshot file not found: {}", snapshot.display()),
        )));
    }

    let config = load_config(config_path)?;
    let service = build_sync_service(&config)?;

    let (_file_watch, mutations) = watch_file(snapshot, FILE_EVENT_DEBOUNCE)?;

    let (handle, inbox) = message::channel(BACKEND_QUEUE);
    let backend = tokio::spawn(message::serve(inbox, service));

    let watcher_config = watcher_config(poll_ms);
    let watcher = Watcher::new(SnapshotFileHost::new(snapshot), handle, watcher_config);

    println!("Watching {} (Ctrl-C to stop)", snapshot.display());
    tokio::select! {
        () = watcher.run(mutations) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            println!("Stopped");
        }
    }

    backend
        .await
        .map_err(|error| CliError::Task(error.to_string()))
}

pub fn watcher_config(poll_ms: u64) -> WatcherConfig {
    WatcherConfig {
        poll_interval: Duration::from_millis(poll_ms.max(100)),
        ..WatcherConfig::default()
    }
}
