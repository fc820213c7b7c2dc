//! Synchronization between the backend and the status cache.
//!
//! [`SyncCoordinator`] owns the reconciliation rules (initial load, discovery,
//! per-item refresh, rename handling) and the gated item operations.
//! [`WorkingCopyConnection`] ties a coordinator to a live watch feed.

mod coordinator;
mod operations;
mod rename;
mod runtime;

pub use coordinator::{LoadReport, SyncCoordinator};
pub use rename::RenameOutcome;
pub use runtime::{resolve_root, StopHandle, WorkingCopyConnection};
