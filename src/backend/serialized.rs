//! Serializes every backend call made through one working-copy connection.

use super::contract::{LogEntry, VersionControlBackend};
use crate::error::BackendError;
use crate::status::StatusEntry;
use crate::types::{Revision, RevisionRange, StatusDepth};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decorator that lets at most one call into the wrapped backend run at a time
///
/// Backend clients are not assumed to be safe for concurrent use against the
/// same working copy.
pub struct SerializedBackend {
    inner: Arc<dyn VersionControlBackend>,
    gate: Mutex<()>,
}

impl SerializedBackend {
    pub fn new(inner: Arc<dyn VersionControlBackend>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    fn call<T>(&self, f: impl FnOnce(&dyn VersionControlBackend) -> T) -> T {
        let _guard = self.gate.lock();
        f(self.inner.as_ref())
    }
}

impl VersionControlBackend for SerializedBackend {
    fn query_status(
        &self,
        path: &Path,
        depth: StatusDepth,
    ) -> Result<Vec<StatusEntry>, BackendError> {
        self.call(|b| b.query_status(path, depth))
    }

    fn add(&self, path: &Path) -> Result<(), BackendError> {
        self.call(|b| b.add(path))
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), BackendError> {
        self.call(|b| b.commit(paths, message))
    }

    fn lock(&self, path: &Path, comment: &str) -> Result<(), BackendError> {
        self.call(|b| b.lock(path, comment))
    }

    fn unlock(&self, path: &Path) -> Result<(), BackendError> {
        self.call(|b| b.unlock(path))
    }

    fn revert(&self, path: &Path) -> Result<(), BackendError> {
        self.call(|b| b.revert(path))
    }

    fn update(&self, path: &Path) -> Result<(), BackendError> {
        self.call(|b| b.update(path))
    }

    fn update_to_revision(&self, path: &Path, revision: Revision) -> Result<(), BackendError> {
        self.call(|b| b.update_to_revision(path, revision))
    }

    fn merge(&self, path: &Path, range: RevisionRange) -> Result<(), BackendError> {
        self.call(|b| b.merge(path, range))
    }

    fn move_item(&self, from: &Path, to: &Path) -> Result<(), BackendError> {
        self.call(|b| b.move_item(from, to))
    }

    fn set_remote_property(
        &self,
        uri: &str,
        name: &str,
        value: &str,
        message: &str,
    ) -> Result<(), BackendError> {
        self.call(|b| b.set_remote_property(uri, name, value, message))
    }

    fn get_remote_property(&self, uri: &str, name: &str) -> Result<Option<String>, BackendError> {
        self.call(|b| b.get_remote_property(uri, name))
    }

    fn resolve_uri(&self, path: &Path) -> Result<Option<String>, BackendError> {
        self.call(|b| b.resolve_uri(path))
    }

    fn working_copy_root(&self, path: &Path) -> Result<Option<PathBuf>, BackendError> {
        self.call(|b| b.working_copy_root(path))
    }

    fn retrieve_content_at_revision(
        &self,
        uri: &str,
        revision: Revision,
    ) -> Result<Vec<u8>, BackendError> {
        self.call(|b| b.retrieve_content_at_revision(uri, revision))
    }

    fn history(&self, path: &Path) -> Result<Vec<LogEntry>, BackendError> {
        self.call(|b| b.history(path))
    }
}
