// Filesystem watcher for the declarative file (§4.6 "Watch"): on
// modification it triggers a sync, never a full re-seed -- the file is
// source-of-truth only for initial seeding and manual reseeds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, info, warn};

use crate::sync::ConfigReconciler;

/// Spawns a blocking thread that watches `path` for modifications and a
/// tokio task that drains its events, invoking `reconciler.sync()` on each
/// one. The watcher itself is returned so the caller can keep it alive for
/// the process lifetime (dropping it stops the watch).
pub fn start(path: PathBuf, reconciler: Arc<ConfigReconciler>) -> notify::Result<RecommendedWatcher> {
    let (tx, rx) = mpsc::channel();
    let config = Config::default();
    let mut watcher = RecommendedWatcher::new(tx, config)?;

    // watchdog-style PatternMatchingEventHandler watched the containing
    // directory non-recursively and filtered by filename; notify's
    // NonRecursive mode on the file's parent does the same.
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    watcher.watch(&parent, RecursiveMode::NonRecursive)?;

    let (event_tx, mut event_rx) = tokio_mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for event in rx {
            match event {
                Ok(event) if is_relevant(&event, &path) => {
                    if event_tx.send(()).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "declarative file watcher error");
                }
            }
        }
    });

    tokio::spawn(async move {
        while event_rx.recv().await.is_some() {
            info!("declarative file modified, syncing from database instead of re-seeding");
            if let Err(e) = reconciler.sync().await {
                warn!(error = %e, "sync triggered by file watch failed");
            }
        }
    });

    Ok(watcher)
}

fn is_relevant(event: &Event, watched_file: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| p == watched_file)
}
