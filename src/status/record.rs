//! Status records: immutable per-path snapshots of version-control state.

use crate::types::Revision;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Local node status, mirroring the backend's status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionState {
    /// Sentinel for paths the backend has never reported
    NotExisting,
    NotVersioned,
    Normal,
    Added,
    Modified,
    Conflicted,
    Missing,
    Deleted,
    Replaced,
    Ignored,
    Obstructed,
    External,
    Incomplete,
    Merged,
}

impl VersionState {
    pub fn is_versioned(&self) -> bool {
        matches!(
            self,
            VersionState::Normal
                | VersionState::Added
                | VersionState::Modified
                | VersionState::Conflicted
                | VersionState::Missing
                | VersionState::Deleted
                | VersionState::Replaced
                | VersionState::Incomplete
                | VersionState::Merged
        )
    }

    /// Local changes that a commit or revert would act on
    pub fn is_modified(&self) -> bool {
        matches!(
            self,
            VersionState::Added
                | VersionState::Modified
                | VersionState::Conflicted
                | VersionState::Deleted
                | VersionState::Replaced
                | VersionState::Merged
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            VersionState::NotExisting => "not-existing",
            VersionState::NotVersioned => "not-versioned",
            VersionState::Normal => "normal",
            VersionState::Added => "added",
            VersionState::Modified => "modified",
            VersionState::Conflicted => "conflicted",
            VersionState::Missing => "missing",
            VersionState::Deleted => "deleted",
            VersionState::Replaced => "replaced",
            VersionState::Ignored => "ignored",
            VersionState::Obstructed => "obstructed",
            VersionState::External => "external",
            VersionState::Incomplete => "incomplete",
            VersionState::Merged => "merged",
        }
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Node kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
    Unknown,
}

impl NodeKind {
    /// Kind of whatever currently sits at `path` on disk
    pub fn probe(path: &Path) -> Self {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => NodeKind::Directory,
            Ok(_) => NodeKind::File,
            Err(_) => NodeKind::Unknown,
        }
    }
}

/// Raw status snapshot for one node as produced by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub state: VersionState,
    pub kind: NodeKind,
    pub locked: bool,
    pub uri: Option<String>,
    pub revision: Option<Revision>,
}

impl StatusData {
    /// Snapshot used for paths the backend does not know
    pub const NOT_EXISTING: StatusData = StatusData {
        state: VersionState::NotExisting,
        kind: NodeKind::Unknown,
        locked: false,
        uri: None,
        revision: None,
    };

    pub fn new(state: VersionState, kind: NodeKind) -> Self {
        Self {
            state,
            kind,
            locked: false,
            uri: None,
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_lock(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

/// One backend status result: the path it was reported for and its snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: PathBuf,
    pub data: StatusData,
}

impl StatusEntry {
    pub fn new(path: impl Into<PathBuf>, data: StatusData) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

/// StatusRecord: cached version-control state of one path
///
/// Records are never mutated after construction; the cache replaces them whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    path: PathBuf,
    data: StatusData,
}

impl StatusRecord {
    pub fn new(path: impl Into<PathBuf>, data: StatusData) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Sentinel record returned for paths absent from the cache
    pub fn not_existing(path: impl Into<PathBuf>) -> Self {
        Self::new(path, StatusData::NOT_EXISTING)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &StatusData {
        &self.data
    }

    pub fn version_state(&self) -> VersionState {
        self.data.state
    }

    pub fn node_kind(&self) -> NodeKind {
        self.data.kind
    }

    pub fn uri(&self) -> Option<&str> {
        self.data.uri.as_deref()
    }

    pub fn revision(&self) -> Option<Revision> {
        self.data.revision
    }

    pub fn exists(&self) -> bool {
        self.data.state != VersionState::NotExisting
    }

    pub fn is_versioned(&self) -> bool {
        self.data.state.is_versioned()
    }

    /// Whether an add would be accepted: the node is present on disk and not ignored
    pub fn is_versionable(&self) -> bool {
        match self.data.state {
            VersionState::NotVersioned => true,
            state => state.is_versioned() && state != VersionState::Missing,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.data.state.is_modified()
    }

    pub fn is_locked(&self) -> bool {
        self.data.locked
    }
}

impl From<StatusEntry> for StatusRecord {
    fn from(entry: StatusEntry) -> Self {
        StatusRecord::new(entry.path, entry.data)
    }
}
