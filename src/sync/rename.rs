//! Rename reconciliation, keyed on the old path's cached state.

use super::coordinator::SyncCoordinator;
use crate::status::VersionState;
use crate::types::StatusDepth;
use std::path::Path;
use tracing::{debug, warn};

/// Which reconciliation a rename received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Old path was unversioned: dropped, new path discovered
    DroppedOldDiscoveredNew,
    /// Old path was scheduled for addition: bulk refresh, then old path dropped
    RefreshedThenDroppedOld,
    /// Old path was versioned and clean: bulk refresh
    RefreshedAll,
    /// Old path was never cached: new path discovered
    DiscoveredNew,
    /// Any other state: old path refreshed, new path discovered
    RefreshedOldDiscoveredNew(VersionState),
}

impl SyncCoordinator {
    /// Bring the cache in line after `old` was renamed to `new`
    pub fn rename_reconcile(&self, old: &Path, new: &Path) -> RenameOutcome {
        let state = self.lookup(old).version_state();
        debug!(from = %old.display(), to = %new.display(), state = %state, "Reconciling rename");

        match state {
            VersionState::NotVersioned => {
                self.cache().remove(old);
                self.discover_quietly(new);
                RenameOutcome::DroppedOldDiscoveredNew
            }
            VersionState::Added => {
                self.refresh_all();
                self.cache().remove(old);
                RenameOutcome::RefreshedThenDroppedOld
            }
            VersionState::Normal => {
                self.refresh_all();
                RenameOutcome::RefreshedAll
            }
            VersionState::NotExisting => {
                self.discover_quietly(new);
                RenameOutcome::DiscoveredNew
            }
            other => {
                warn!(
                    from = %old.display(),
                    to = %new.display(),
                    state = %other,
                    "Rename of a {} entry, refreshing old path and discovering new one",
                    other
                );
                self.refresh_path(old);
                self.discover_quietly(new);
                RenameOutcome::RefreshedOldDiscoveredNew(other)
            }
        }
    }

    fn discover_quietly(&self, path: &Path) {
        if let Err(e) = self.discover(path, StatusDepth::Infinity) {
            warn!(path = %path.display(), error = %e, "Failed to discover renamed path");
        }
    }
}
