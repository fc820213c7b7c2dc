//! SyncCoordinator: keeps one StatusCache consistent with the backend.
//!
//! Every backend call goes through a [`SerializedBackend`], so one connection never
//! has two calls in flight. The cache emits every notification itself; the
//! coordinator only decides which paths to reconcile and how.

use crate::backend::{SerializedBackend, VersionControlBackend};
use crate::config::{IgnoreSettings, SvnCacheConfig};
use crate::error::BackendError;
use crate::status::{
    Reconciled, RefreshOutcome, RefreshReport, StatusCache, StatusRecord, Subscription,
};
use crate::types::StatusDepth;
use crate::watch::WatchEvent;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the initial recursive load
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Entries that changed the cache
    pub inserted: usize,
    /// Set when the backend query failed; the cache is left as it was
    pub error: Option<BackendError>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Reconciles backend state into the cache for one working copy
pub struct SyncCoordinator {
    backend: SerializedBackend,
    cache: Arc<StatusCache>,
    root: PathBuf,
    admin_dir: String,
    ignore: IgnoreSettings,
}

impl SyncCoordinator {
    pub fn new(
        backend: Arc<dyn VersionControlBackend>,
        root: impl Into<PathBuf>,
        config: &SvnCacheConfig,
    ) -> Self {
        let cache = StatusCache::new().with_max_passes(config.refresh.max_passes);
        Self {
            backend: SerializedBackend::new(backend),
            cache: Arc::new(cache),
            root: root.into(),
            admin_dir: config.backend.admin_dir.clone(),
            ignore: config.ignore.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    pub(crate) fn backend(&self) -> &dyn VersionControlBackend {
        &self.backend
    }

    pub fn subscribe(&self) -> Subscription {
        self.cache.subscribe()
    }

    /// Cached record for `path`, or the not-existing sentinel
    pub fn lookup(&self, path: &Path) -> Arc<StatusRecord> {
        self.cache.lookup(path)
    }

    pub fn mappings(&self) -> HashMap<PathBuf, Arc<StatusRecord>> {
        self.cache.snapshot()
    }

    /// Populate the cache from one recursive status query of the root
    ///
    /// A backend failure is logged and reported, never raised; the cache keeps
    /// whatever it held before.
    pub fn load_initial(&self) -> LoadReport {
        info!(root = %self.root.display(), "Loading initial working-copy status");
        match self.discover(&self.root, StatusDepth::Infinity) {
            Ok(inserted) => {
                info!(entries = self.cache.len(), inserted, "Initial status loaded");
                LoadReport {
                    inserted,
                    error: None,
                }
            }
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Initial status load failed");
                LoadReport {
                    inserted: 0,
                    error: Some(e),
                }
            }
        }
    }

    /// Query `path` at `depth` and insert every reported entry
    ///
    /// Returns how many inserts changed the cache.
    pub fn discover(&self, path: &Path, depth: StatusDepth) -> Result<usize, BackendError> {
        let entries = self.backend.query_status(path, depth)?;
        let inserted = entries
            .into_iter()
            .map(|entry| self.cache.insert(StatusRecord::from(entry)))
            .filter(|changed| *changed)
            .count();
        debug!(path = %path.display(), depth = depth.as_arg(), inserted, "Discovered status");
        Ok(inserted)
    }

    /// Single-item reconciliation used for every per-path refresh
    pub fn reconcile_one(&self, record: &StatusRecord) -> Result<Reconciled, BackendError> {
        let entries = self
            .backend
            .query_status(record.path(), StatusDepth::Empty)?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.path == record.path())
            .map(|entry| Reconciled::Current(entry.data))
            .unwrap_or(Reconciled::Retired))
    }

    /// React to a change the filesystem reported for `path`
    pub fn handle_external_change(&self, path: &Path) {
        if self.is_admin_path(path) {
            return;
        }
        self.refresh_path(path);
    }

    /// Bring `path` up to date after a mutating operation on it
    pub fn after_operation(&self, path: &Path) {
        self.refresh_path(path);
    }

    pub fn apply_watch_event(&self, event: &WatchEvent) {
        match event {
            WatchEvent::Renamed { from, to } => {
                if self.is_admin_path(from) && self.is_admin_path(to) {
                    return;
                }
                self.rename_reconcile(from, to);
            }
            other => self.handle_external_change(other.path()),
        }
    }

    /// Re-evaluate every cached entry against the backend
    pub fn refresh_all(&self) -> RefreshReport {
        self.cache.refresh_all(|record| self.reconcile_one(record))
    }

    pub(crate) fn refresh_path(&self, path: &Path) {
        if self.cache.contains(path) {
            let outcome = self
                .cache
                .refresh_one(path, |record| self.reconcile_one(record));
            if outcome != RefreshOutcome::Vanished {
                return;
            }
        }
        if let Err(e) = self.discover(path, StatusDepth::Empty) {
            warn!(path = %path.display(), error = %e, "Failed to discover status");
        }
    }

    pub fn is_working_copy(&self, path: &Path) -> bool {
        matches!(self.backend.resolve_uri(path), Ok(Some(_)))
    }

    pub fn working_copy_root(&self, path: &Path) -> Option<PathBuf> {
        match self.backend.working_copy_root(path) {
            Ok(root) => root,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to resolve working-copy root");
                None
            }
        }
    }

    /// Make sure the root's ignore property lists every configured pattern
    ///
    /// Returns whether the property was written. Existing patterns are kept in
    /// their order and missing ones appended; nothing is written when none are missing.
    pub fn ensure_ignore_patterns(&self) -> Result<bool, BackendError> {
        let uri = self
            .backend
            .resolve_uri(&self.root)?
            .ok_or_else(|| BackendError::MissingUri(self.root.clone()))?;
        let current = self
            .backend
            .get_remote_property(&uri, &self.ignore.property)?
            .unwrap_or_default();

        let mut patterns: Vec<String> = current
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let mut missing: Vec<String> = Vec::new();
        for pattern in &self.ignore.patterns {
            if !patterns.contains(pattern) && !missing.contains(pattern) {
                missing.push(pattern.clone());
            }
        }
        if missing.is_empty() {
            debug!(uri = %uri, "Ignore list already complete");
            return Ok(false);
        }

        info!(uri = %uri, added = ?missing, "Extending ignore list");
        patterns.extend(missing);
        self.backend.set_remote_property(
            &uri,
            &self.ignore.property,
            &patterns.join("\n"),
            &self.ignore.log_message,
        )?;
        self.backend.update(&self.root)?;
        Ok(true)
    }

    fn is_admin_path(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => name == self.admin_dir.as_str(),
            _ => false,
        })
    }
}
