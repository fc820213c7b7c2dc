//! svncache: Subversion Working-Copy Status Cache
//!
//! Keeps an observable, in-memory map from path to version-control status for one
//! working copy. The map is filled by a recursive status query at connect time and
//! kept current by filesystem watch events, per-item refreshes after mutating
//! operations, and re-entrant-safe bulk refreshes. Subscribers receive a
//! notification for every effective change.

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod status;
pub mod sync;
pub mod tooling;
pub mod types;
pub mod watch;
