//! In-memory backend simulating a single working copy.
//!
//! Keeps a node table with the same status vocabulary the real client reports,
//! applies mutating operations with Subversion's rules, and journals every call
//! so tests can assert which backend calls a coordinator made.

use super::contract::{LogEntry, VersionControlBackend};
use crate::error::BackendError;
use crate::status::{NodeKind, StatusData, StatusEntry, VersionState};
use crate::types::{Revision, RevisionRange, StatusDepth};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One journaled backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    QueryStatus { path: PathBuf, depth: StatusDepth },
    Add(PathBuf),
    Commit(Vec<PathBuf>),
    Lock(PathBuf),
    Unlock(PathBuf),
    Revert(PathBuf),
    Update(PathBuf),
    UpdateToRevision { path: PathBuf, revision: Revision },
    Merge { path: PathBuf, range: RevisionRange },
    Move { from: PathBuf, to: PathBuf },
    SetRemoteProperty { uri: String, name: String, value: String },
    GetRemoteProperty { uri: String, name: String },
    ResolveUri(PathBuf),
    WorkingCopyRoot(PathBuf),
    RetrieveContent { uri: String, revision: Revision },
    History(PathBuf),
}

impl BackendCall {
    /// Whether the call changes working-copy or repository state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            BackendCall::QueryStatus { .. }
                | BackendCall::GetRemoteProperty { .. }
                | BackendCall::ResolveUri(_)
                | BackendCall::WorkingCopyRoot(_)
                | BackendCall::RetrieveContent { .. }
                | BackendCall::History(_)
        )
    }

    fn operation(&self) -> &'static str {
        match self {
            BackendCall::QueryStatus { .. } => "status",
            BackendCall::Add(_) => "add",
            BackendCall::Commit(_) => "commit",
            BackendCall::Lock(_) => "lock",
            BackendCall::Unlock(_) => "unlock",
            BackendCall::Revert(_) => "revert",
            BackendCall::Update(_) => "update",
            BackendCall::UpdateToRevision { .. } => "update-to-revision",
            BackendCall::Merge { .. } => "merge",
            BackendCall::Move { .. } => "move",
            BackendCall::SetRemoteProperty { .. } => "propset",
            BackendCall::GetRemoteProperty { .. } => "propget",
            BackendCall::ResolveUri(_) => "info",
            BackendCall::WorkingCopyRoot(_) => "info",
            BackendCall::RetrieveContent { .. } => "cat",
            BackendCall::History(_) => "log",
        }
    }
}

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<PathBuf, StatusData>,
    properties: HashMap<(String, String), String>,
    contents: HashMap<(String, Revision), Vec<u8>>,
    history: HashMap<PathBuf, Vec<LogEntry>>,
    head: Revision,
    calls: Vec<BackendCall>,
    failing: HashSet<&'static str>,
    unreachable: bool,
}

/// Simulated working copy rooted at `root`
pub struct MemoryBackend {
    root: PathBuf,
    repository_uri: String,
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_repository(root, "svn://memory/trunk")
    }

    pub fn with_repository(root: impl Into<PathBuf>, repository_uri: impl Into<String>) -> Self {
        let root = root.into();
        let repository_uri = repository_uri.into();
        let mut state = MemoryState {
            head: 1,
            ..MemoryState::default()
        };
        state.nodes.insert(
            root.clone(),
            StatusData::new(VersionState::Normal, NodeKind::Directory)
                .with_revision(1)
                .with_uri(repository_uri.clone()),
        );
        Self {
            root,
            repository_uri,
            state: Mutex::new(state),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository URI a path under the root maps to
    pub fn uri_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut uri = self.repository_uri.clone();
        for component in relative.components() {
            uri.push('/');
            uri.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(uri)
    }

    /// Place a node in the simulated working copy, replacing any previous state
    pub fn set_node(&self, path: impl Into<PathBuf>, data: StatusData) {
        self.state.lock().nodes.insert(path.into(), data);
    }

    /// Simulated working-copy file with the given state
    pub fn set_file(&self, path: impl Into<PathBuf>, state: VersionState) {
        let path = path.into();
        let mut data = StatusData::new(state, NodeKind::File);
        if state.is_versioned() && state != VersionState::Added {
            data.revision = Some(self.state.lock().head);
            data.uri = self.uri_for(&path);
        }
        self.set_node(path, data);
    }

    /// Drop a node entirely, as if it vanished from disk without ever being versioned
    pub fn forget(&self, path: &Path) {
        self.state.lock().nodes.remove(path);
    }

    pub fn node(&self, path: &Path) -> Option<StatusData> {
        self.state.lock().nodes.get(path).cloned()
    }

    pub fn set_content(&self, uri: impl Into<String>, revision: Revision, content: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .contents
            .insert((uri.into(), revision), content.into());
    }

    pub fn push_history(&self, path: impl Into<PathBuf>, entry: LogEntry) {
        self.state
            .lock()
            .history
            .entry(path.into())
            .or_default()
            .push(entry);
    }

    /// Make every call of `operation` (e.g. "commit", "status") fail
    pub fn fail_operation(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing.clear();
        state.unreachable = false;
    }

    /// Make every call fail as if the repository could not be reached
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    pub fn head(&self) -> Revision {
        self.state.lock().head
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<BackendCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.is_mutating())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn journal(&self, call: BackendCall) -> Result<parking_lot::MutexGuard<'_, MemoryState>, BackendError> {
        let mut state = self.state.lock();
        let operation = call.operation();
        state.calls.push(call);
        if state.unreachable {
            return Err(BackendError::Unavailable(format!(
                "{} could not reach {}",
                operation, self.repository_uri
            )));
        }
        if state.failing.contains(operation) {
            return Err(reject(operation, &self.root, "injected failure"));
        }
        Ok(state)
    }
}

fn reject(operation: &str, path: &Path, reason: &str) -> BackendError {
    BackendError::CommandFailed {
        command: format!("{} {}", operation, path.display()),
        code: Some(1),
        stderr: reason.to_string(),
    }
}

impl VersionControlBackend for MemoryBackend {
    fn query_status(
        &self,
        path: &Path,
        depth: StatusDepth,
    ) -> Result<Vec<StatusEntry>, BackendError> {
        let state = self.journal(BackendCall::QueryStatus {
            path: path.to_path_buf(),
            depth,
        })?;
        if !path.starts_with(&self.root) {
            return Err(BackendError::NotWorkingCopy(path.to_path_buf()));
        }
        let entries = match depth {
            StatusDepth::Empty => state
                .nodes
                .get(path)
                .map(|data| vec![StatusEntry::new(path, data.clone())])
                .unwrap_or_default(),
            StatusDepth::Infinity => state
                .nodes
                .iter()
                .filter(|(node, _)| node.starts_with(path))
                .map(|(node, data)| StatusEntry::new(node.clone(), data.clone()))
                .collect(),
        };
        Ok(entries)
    }

    fn add(&self, path: &Path) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Add(path.to_path_buf()))?;
        match state.nodes.get_mut(path) {
            Some(data) if data.state == VersionState::NotVersioned => {
                data.state = VersionState::Added;
                Ok(())
            }
            Some(data) => Err(reject("add", path, &format!("already {}", data.state))),
            None => Err(reject("add", path, "no such file")),
        }
    }

    fn commit(&self, paths: &[PathBuf], _message: &str) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Commit(paths.to_vec()))?;
        for path in paths {
            match state.nodes.get(path) {
                Some(data) if data.state == VersionState::Conflicted => {
                    return Err(reject("commit", path, "remains in conflict"));
                }
                Some(data) if data.state.is_modified() => {}
                Some(_) => return Err(reject("commit", path, "nothing to commit")),
                None => return Err(reject("commit", path, "not under version control")),
            }
        }
        state.head += 1;
        let head = state.head;
        for path in paths {
            let deleted = state
                .nodes
                .get(path)
                .map(|data| data.state == VersionState::Deleted)
                .unwrap_or(false);
            if deleted {
                state.nodes.remove(path);
                continue;
            }
            let uri = self.uri_for(path);
            if let Some(data) = state.nodes.get_mut(path) {
                data.state = VersionState::Normal;
                data.revision = Some(head);
                data.uri = uri;
            }
        }
        Ok(())
    }

    fn lock(&self, path: &Path, _comment: &str) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Lock(path.to_path_buf()))?;
        match state.nodes.get_mut(path) {
            Some(data) if data.locked => Err(reject("lock", path, "already locked")),
            Some(data) if data.state.is_versioned() && data.state != VersionState::Added => {
                data.locked = true;
                Ok(())
            }
            _ => Err(reject("lock", path, "not in repository")),
        }
    }

    fn unlock(&self, path: &Path) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Unlock(path.to_path_buf()))?;
        match state.nodes.get_mut(path) {
            Some(data) if data.locked => {
                data.locked = false;
                Ok(())
            }
            _ => Err(reject("unlock", path, "not locked")),
        }
    }

    fn revert(&self, path: &Path) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Revert(path.to_path_buf()))?;
        match state.nodes.get_mut(path) {
            Some(data) if data.state == VersionState::Added => {
                data.state = VersionState::NotVersioned;
                Ok(())
            }
            Some(data) if data.state.is_versioned() => {
                data.state = VersionState::Normal;
                Ok(())
            }
            _ => Err(reject("revert", path, "not under version control")),
        }
    }

    fn update(&self, path: &Path) -> Result<(), BackendError> {
        let _state = self.journal(BackendCall::Update(path.to_path_buf()))?;
        Ok(())
    }

    fn update_to_revision(&self, path: &Path, revision: Revision) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::UpdateToRevision {
            path: path.to_path_buf(),
            revision,
        })?;
        if revision > state.head || revision < 0 {
            return Err(reject("update", path, "no such revision"));
        }
        let mut touched = false;
        for (node, data) in state.nodes.iter_mut() {
            if node.starts_with(path) && data.state.is_versioned() {
                data.revision = Some(revision);
                touched = true;
            }
        }
        if touched {
            Ok(())
        } else {
            Err(reject("update", path, "not under version control"))
        }
    }

    fn merge(&self, path: &Path, range: RevisionRange) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Merge {
            path: path.to_path_buf(),
            range,
        })?;
        match state.nodes.get_mut(path) {
            Some(data) if data.state.is_versioned() => {
                if range.start != range.end {
                    data.state = VersionState::Modified;
                }
                Ok(())
            }
            _ => Err(reject("merge", path, "not under version control")),
        }
    }

    fn move_item(&self, from: &Path, to: &Path) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })?;
        if state.nodes.contains_key(to) {
            return Err(reject("move", to, "destination already exists"));
        }
        let kind = match state.nodes.get_mut(from) {
            Some(data) if data.state.is_versioned() => {
                data.state = VersionState::Deleted;
                data.kind
            }
            _ => return Err(reject("move", from, "not under version control")),
        };
        state
            .nodes
            .insert(to.to_path_buf(), StatusData::new(VersionState::Added, kind));
        Ok(())
    }

    fn set_remote_property(
        &self,
        uri: &str,
        name: &str,
        value: &str,
        _message: &str,
    ) -> Result<(), BackendError> {
        let mut state = self.journal(BackendCall::SetRemoteProperty {
            uri: uri.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        })?;
        state
            .properties
            .insert((uri.to_string(), name.to_string()), value.to_string());
        state.head += 1;
        Ok(())
    }

    fn get_remote_property(&self, uri: &str, name: &str) -> Result<Option<String>, BackendError> {
        let state = self.journal(BackendCall::GetRemoteProperty {
            uri: uri.to_string(),
            name: name.to_string(),
        })?;
        Ok(state
            .properties
            .get(&(uri.to_string(), name.to_string()))
            .cloned())
    }

    fn resolve_uri(&self, path: &Path) -> Result<Option<String>, BackendError> {
        let state = self.journal(BackendCall::ResolveUri(path.to_path_buf()))?;
        let known = state
            .nodes
            .get(path)
            .map(|data| data.state.is_versioned())
            .unwrap_or(false);
        Ok(if known { self.uri_for(path) } else { None })
    }

    fn working_copy_root(&self, path: &Path) -> Result<Option<PathBuf>, BackendError> {
        let _state = self.journal(BackendCall::WorkingCopyRoot(path.to_path_buf()))?;
        Ok(path.starts_with(&self.root).then(|| self.root.clone()))
    }

    fn retrieve_content_at_revision(
        &self,
        uri: &str,
        revision: Revision,
    ) -> Result<Vec<u8>, BackendError> {
        let state = self.journal(BackendCall::RetrieveContent {
            uri: uri.to_string(),
            revision,
        })?;
        state
            .contents
            .get(&(uri.to_string(), revision))
            .cloned()
            .ok_or_else(|| reject("cat", Path::new(uri), "path not found at revision"))
    }

    fn history(&self, path: &Path) -> Result<Vec<LogEntry>, BackendError> {
        let state = self.journal(BackendCall::History(path.to_path_buf()))?;
        Ok(state.history.get(path).cloned().unwrap_or_default())
    }
}
