//! Backend port: the blocking version-control client the coordinator talks to.

use crate::error::BackendError;
use crate::status::StatusEntry;
use crate::types::{Revision, RevisionRange, StatusDepth};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One history entry for a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub revision: Revision,
    pub author: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

/// Version-control client for one working copy
///
/// Every call blocks until the backend answers. Mutating calls return `Ok(())`
/// on success; a rejected or failed operation is an `Err`.
pub trait VersionControlBackend: Send + Sync {
    /// Status of `path` and, for [`StatusDepth::Infinity`], everything below it.
    /// Unmodified entries are included.
    fn query_status(&self, path: &Path, depth: StatusDepth)
        -> Result<Vec<StatusEntry>, BackendError>;

    /// Schedule a single node for addition, creating versioned parents as needed
    fn add(&self, path: &Path) -> Result<(), BackendError>;

    /// Commit the given nodes as one changeset (non-recursive)
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), BackendError>;

    fn lock(&self, path: &Path, comment: &str) -> Result<(), BackendError>;

    fn unlock(&self, path: &Path) -> Result<(), BackendError>;

    fn revert(&self, path: &Path) -> Result<(), BackendError>;

    fn update(&self, path: &Path) -> Result<(), BackendError>;

    fn update_to_revision(&self, path: &Path, revision: Revision) -> Result<(), BackendError>;

    /// Merge the changes of `range` on the node's own history into the node
    fn merge(&self, path: &Path, range: RevisionRange) -> Result<(), BackendError>;

    fn move_item(&self, from: &Path, to: &Path) -> Result<(), BackendError>;

    /// Set a versioned property directly in the repository, committing with `message`
    fn set_remote_property(
        &self,
        uri: &str,
        name: &str,
        value: &str,
        message: &str,
    ) -> Result<(), BackendError>;

    /// Read a versioned property from the repository; `None` when unset
    fn get_remote_property(&self, uri: &str, name: &str) -> Result<Option<String>, BackendError>;

    /// Repository URI for a local path; `None` outside a working copy
    fn resolve_uri(&self, path: &Path) -> Result<Option<String>, BackendError>;

    fn working_copy_root(&self, path: &Path) -> Result<Option<PathBuf>, BackendError>;

    fn retrieve_content_at_revision(
        &self,
        uri: &str,
        revision: Revision,
    ) -> Result<Vec<u8>, BackendError>;

    fn history(&self, path: &Path) -> Result<Vec<LogEntry>, BackendError>;
}
