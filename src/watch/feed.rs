//! Recursive filesystem watcher rooted at a working copy.

use super::events::{convert_event, WatchEvent};
use crate::error::ApiError;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Result of waiting on the feed
#[derive(Debug, PartialEq, Eq)]
pub enum FeedPoll {
    Events(Vec<WatchEvent>),
    /// Nothing arrived before the timeout
    Idle,
    /// The underlying watcher is gone
    Closed,
}

/// Live watch on one working-copy directory
///
/// The watch ends when the feed is dropped.
pub struct WatchFeed {
    root: PathBuf,
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<Event>>,
}

impl WatchFeed {
    /// Start watching `root` and everything below it
    pub fn start(root: &Path) -> Result<Self, ApiError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| ApiError::WatchError(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| {
                ApiError::WatchError(format!(
                    "Failed to watch directory {}: {}",
                    root.display(),
                    e
                ))
            })?;

        info!(root = %root.display(), "Watching working copy");
        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
            rx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait up to `timeout` for the next raw event and convert it
    pub fn poll(&self, timeout: Duration) -> FeedPoll {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(event)) => FeedPoll::Events(convert_event(event)),
            Ok(Err(e)) => {
                warn!("Watch error: {}", e);
                FeedPoll::Events(Vec::new())
            }
            Err(mpsc::RecvTimeoutError::Timeout) => FeedPoll::Idle,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                error!("Watcher channel disconnected");
                FeedPoll::Closed
            }
        }
    }
}
