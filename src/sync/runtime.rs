//! Working-copy connection and its watch loop.

use super::coordinator::{LoadReport, SyncCoordinator};
use crate::backend::VersionControlBackend;
use crate::config::{SvnCacheConfig, WatchSettings};
use crate::error::ApiError;
use crate::watch::{EventBatcher, FeedPoll, WatchEvent, WatchFeed};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// One open working copy: coordinator, cache and (optionally) a live watch feed
///
/// Dropping the connection drops the cache and ends the watch.
pub struct WorkingCopyConnection {
    coordinator: Arc<SyncCoordinator>,
    feed: Option<Mutex<WatchFeed>>,
    watch: WatchSettings,
    running: Arc<RwLock<bool>>,
    load_report: LoadReport,
}

impl WorkingCopyConnection {
    /// Connect to the working copy at `root`
    ///
    /// Returns `Ok(None)` when `root` is not inside a working copy. Backend
    /// failures during the initial load or the ignore-list update are logged and
    /// leave the connection usable; only watcher startup errors are returned.
    pub fn open(
        backend: Arc<dyn VersionControlBackend>,
        root: &Path,
        config: &SvnCacheConfig,
    ) -> Result<Option<Self>, ApiError> {
        let root = resolve_root(root);

        let coordinator = Arc::new(SyncCoordinator::new(backend, root.clone(), config));
        if !coordinator.is_working_copy(&root) {
            info!(root = %root.display(), "Not a working copy");
            return Ok(None);
        }

        let load_report = coordinator.load_initial();

        match coordinator.ensure_ignore_patterns() {
            Ok(true) => info!(root = %root.display(), "Ignore list updated"),
            Ok(false) => {}
            Err(e) => warn!(root = %root.display(), error = %e, "Failed to update ignore list"),
        }

        let feed = if config.watch.enabled {
            Some(Mutex::new(WatchFeed::start(&root)?))
        } else {
            None
        };

        Ok(Some(Self {
            coordinator,
            running: Arc::new(RwLock::new(feed.is_some())),
            feed,
            watch: config.watch.clone(),
            load_report,
        }))
    }

    pub fn root(&self) -> &Path {
        self.coordinator.root()
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn is_watching(&self) -> bool {
        self.feed.is_some()
    }

    /// Handle that ends a running [`run`](Self::run) loop from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn stop(&self) {
        *self.running.write() = false;
    }

    /// Feed watch events into the coordinator until stopped or the watcher closes
    ///
    /// Events are collected for one batch window and collapsed per path before
    /// being applied in arrival order. A stop requested before the loop starts
    /// is honoured; a stopped connection does not watch again.
    pub fn run(&self) -> Result<(), ApiError> {
        let feed = self.feed.as_ref().ok_or_else(|| {
            ApiError::WatchError(format!(
                "Watching is disabled for {}",
                self.root().display()
            ))
        })?;
        let feed = feed.lock();

        info!(root = %self.root().display(), "Watch loop started");

        let mut batcher = EventBatcher::new(self.watch.max_batch_size);
        let batch_window = Duration::from_millis(self.watch.batch_window_ms);
        let mut last_batch_time = Instant::now();

        loop {
            if !*self.running.read() {
                break;
            }

            let timeout = batch_window
                .saturating_sub(last_batch_time.elapsed())
                .max(Duration::from_millis(1));
            match feed.poll(timeout) {
                FeedPoll::Events(events) => {
                    for event in events {
                        if batcher.add_event(event) {
                            self.process_events(batcher.take_batch());
                            last_batch_time = Instant::now();
                        }
                    }
                }
                FeedPoll::Idle => {}
                FeedPoll::Closed => {
                    error!(root = %self.root().display(), "Watch feed closed");
                    break;
                }
            }

            if last_batch_time.elapsed() >= batch_window {
                if !batcher.is_empty() {
                    self.process_events(batcher.take_batch());
                }
                last_batch_time = Instant::now();
            }
        }

        if !batcher.is_empty() {
            self.process_events(batcher.take_batch());
        }
        *self.running.write() = false;
        info!(root = %self.root().display(), "Watch loop stopped");
        Ok(())
    }

    fn process_events(&self, events: Vec<WatchEvent>) {
        if events.is_empty() {
            return;
        }
        debug!(event_count = events.len(), "Processing watch events");
        for event in &events {
            debug!(kind = event.kind_label(), path = %event.path().display(), "Watch event");
            self.coordinator.apply_watch_event(event);
        }
    }
}

/// Cloneable stop signal for a running watch loop
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<RwLock<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        *self.running.write() = false;
    }
}

/// Canonical form of a user-supplied working-copy path
pub fn resolve_root(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::status::VersionState;
    use std::thread;

    fn quiet_config() -> SvnCacheConfig {
        let mut config = SvnCacheConfig::default();
        config.watch.enabled = false;
        config
    }

    #[test]
    fn test_open_outside_working_copy_is_none() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(root.join("elsewhere")));
        let connection = WorkingCopyConnection::open(backend, &root, &quiet_config()).unwrap();
        assert!(connection.is_none());
    }

    #[test]
    fn test_open_loads_cache_and_ignore_list() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(&root));
        backend.set_file(root.join("a.txt"), VersionState::Normal);

        let connection = WorkingCopyConnection::open(backend.clone(), &root, &quiet_config())
            .unwrap()
            .unwrap();

        assert!(connection.load_report().is_complete());
        assert!(!connection.is_watching());
        assert_eq!(
            connection
                .coordinator()
                .lookup(&root.join("a.txt"))
                .version_state(),
            VersionState::Normal
        );
        assert!(backend
            .get_remote_property("svn://memory/trunk", "svn:ignore")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_run_without_watch_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(&root));
        let connection = WorkingCopyConnection::open(backend, &root, &quiet_config())
            .unwrap()
            .unwrap();
        assert!(matches!(connection.run(), Err(ApiError::WatchError(_))));
    }

    #[test]
    fn test_stop_before_run_ends_loop() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(&root));
        let mut config = SvnCacheConfig::default();
        config.watch.batch_window_ms = 20;

        let connection = Arc::new(
            WorkingCopyConnection::open(backend, &root, &config)
                .unwrap()
                .unwrap(),
        );
        connection.stop_handle().stop();

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        {
            let connection = Arc::clone(&connection);
            thread::spawn(move || {
                let result = connection.run();
                let _ = done_tx.send(result.is_ok());
            });
        }

        let finished = done_rx.recv_timeout(Duration::from_secs(2));
        assert_eq!(finished, Ok(true), "run() kept going after an earlier stop()");
    }

    #[test]
    fn test_watch_loop_discovers_new_file() {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(&root));
        let mut config = SvnCacheConfig::default();
        config.watch.batch_window_ms = 20;

        let connection = Arc::new(
            WorkingCopyConnection::open(backend.clone(), &root, &config)
                .unwrap()
                .unwrap(),
        );
        let events = connection.coordinator().subscribe();
        let stop = connection.stop_handle();
        let runner = {
            let connection = Arc::clone(&connection);
            thread::spawn(move || connection.run())
        };

        let created = root.join("fresh.txt");
        backend.set_file(&created, VersionState::NotVersioned);
        thread::sleep(Duration::from_millis(100));
        std::fs::write(&created, "hello").unwrap();

        let mut seen = false;
        for _ in 0..50 {
            if let Some(event) = events.next_timeout(Duration::from_millis(100)) {
                if event.path == created {
                    seen = true;
                    break;
                }
            }
        }
        stop.stop();
        runner.join().unwrap().unwrap();
        assert!(seen, "expected a notification for {}", created.display());
    }
}
