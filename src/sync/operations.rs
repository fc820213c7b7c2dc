//! Item operations on the working copy.
//!
//! Single-item operations are gated on the cached record: when the record says the
//! operation cannot apply, they return `false` without touching the backend. A
//! backend failure is logged and also reported as `false`. Every success is
//! followed by a refresh of the affected path so subscribers see the new state.

use super::coordinator::SyncCoordinator;
use crate::backend::LogEntry;
use crate::error::{ApiError, BackendError};
use crate::status::{NodeKind, StatusRecord};
use crate::types::{Revision, RevisionRange, StatusDepth};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

impl SyncCoordinator {
    /// Schedule an unversioned item for addition
    pub fn add(&self, path: &Path) -> bool {
        self.gated(
            path,
            "add",
            |record| record.is_versionable() && !record.is_versioned(),
            |coordinator| coordinator.backend().add(path),
        )
    }

    pub fn lock(&self, path: &Path, comment: &str) -> bool {
        self.gated(path, "lock", |record| !record.is_locked(), |coordinator| {
            coordinator.backend().lock(path, comment)
        })
    }

    pub fn release_lock(&self, path: &Path) -> bool {
        self.gated(path, "unlock", |record| record.is_locked(), |coordinator| {
            coordinator.backend().unlock(path)
        })
    }

    /// Commit one modified item on its own
    pub fn commit(&self, path: &Path, message: &str) -> bool {
        self.gated(
            path,
            "commit",
            |record| record.is_versioned() && record.is_modified(),
            |coordinator| coordinator.backend().commit(&[path.to_path_buf()], message),
        )
    }

    pub fn revert(&self, path: &Path) -> bool {
        self.gated(path, "revert", |record| record.is_modified(), |coordinator| {
            coordinator.backend().revert(path)
        })
    }

    /// Commit several items as one changeset
    ///
    /// Not gated per item. Either every path is refreshed afterwards or, when the
    /// commit fails, none is.
    pub fn commit_all(&self, paths: &[PathBuf], message: &str) -> bool {
        if paths.is_empty() {
            debug!("Nothing to commit");
            return false;
        }
        match self.backend().commit(paths, message) {
            Ok(()) => {
                info!(count = paths.len(), "Committed changeset");
                for path in paths {
                    self.after_operation(path);
                }
                true
            }
            Err(e) => {
                warn!(count = paths.len(), error = %e, "Batch commit failed");
                false
            }
        }
    }

    /// Bring `path` up to the repository head
    pub fn update(&self, path: &Path) -> bool {
        self.ungated(path, "update", |coordinator| coordinator.backend().update(path))
    }

    pub fn update_to_revision(&self, path: &Path, revision: Revision) -> bool {
        self.ungated(path, "update-to-revision", |coordinator| {
            coordinator.backend().update_to_revision(path, revision)
        })
    }

    /// Merge `start:end` of the item's own history into it; a backwards range undoes changes
    pub fn reverse_merge(&self, path: &Path, start: Revision, end: Revision) -> bool {
        let range = RevisionRange::new(start, end);
        let operation = if range.is_reverse() { "reverse-merge" } else { "merge" };
        self.ungated(path, operation, |coordinator| coordinator.backend().merge(path, range))
    }

    /// Versioned move followed by rename reconciliation
    pub fn rename(&self, from: &Path, to: &Path) -> bool {
        match self.backend().move_item(from, to) {
            Ok(()) => {
                info!(from = %from.display(), to = %to.display(), "Moved item");
                let outcome = self.rename_reconcile(from, to);
                debug!(?outcome, "Rename reconciled");
                // A versioned move leaves the source scheduled for deletion and the target added
                self.after_operation(from);
                self.after_operation(to);
                true
            }
            Err(e) => {
                warn!(from = %from.display(), to = %to.display(), error = %e, "Move failed");
                false
            }
        }
    }

    pub fn history(&self, path: &Path) -> Result<Vec<LogEntry>, BackendError> {
        self.backend().history(path)
    }

    /// Write the content `local` had at `revision` to `destination`
    ///
    /// A stale destination file is removed first, even when retrieval later fails.
    pub fn write_revision(
        &self,
        local: &Path,
        destination: &Path,
        revision: Revision,
    ) -> Result<(), ApiError> {
        if destination.is_file() {
            let mut permissions = std::fs::metadata(destination)?.permissions();
            if permissions.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(false);
                std::fs::set_permissions(destination, permissions)?;
            }
            std::fs::remove_file(destination)?;
        }

        let record = self.lookup(local);
        let uri = match record.uri() {
            Some(uri) => uri.to_string(),
            None => self
                .backend()
                .resolve_uri(local)?
                .ok_or_else(|| BackendError::MissingUri(local.to_path_buf()))?,
        };
        let content = self.backend().retrieve_content_at_revision(&uri, revision)?;
        std::fs::write(destination, content)?;
        info!(
            path = %local.display(),
            revision,
            destination = %destination.display(),
            "Wrote historical content"
        );
        Ok(())
    }

    fn gated<P, F>(&self, path: &Path, operation: &str, precondition: P, call: F) -> bool
    where
        P: FnOnce(&StatusRecord) -> bool,
        F: FnOnce(&Self) -> Result<(), BackendError>,
    {
        let record = self.lookup(path);
        if !precondition(&record) {
            debug!(
                path = %path.display(),
                operation,
                state = %record.version_state(),
                locked = record.is_locked(),
                "Operation not applicable"
            );
            return false;
        }
        self.ungated(path, operation, call)
    }

    fn ungated<F>(&self, path: &Path, operation: &str, call: F) -> bool
    where
        F: FnOnce(&Self) -> Result<(), BackendError>,
    {
        match call(self) {
            Ok(()) => {
                info!(path = %path.display(), operation, "Operation succeeded");
                self.after_operation(path);
                if self.lookup(path).node_kind() == NodeKind::Directory {
                    self.refresh_subtree(path);
                }
                true
            }
            Err(e) => {
                warn!(path = %path.display(), operation, error = %e, "Operation failed");
                false
            }
        }
    }

    /// Directory operations touch their children as well
    fn refresh_subtree(&self, path: &Path) {
        if let Err(e) = self.discover(path, StatusDepth::Infinity) {
            warn!(path = %path.display(), error = %e, "Failed to refresh subtree");
        }
    }
}
