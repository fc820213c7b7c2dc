//! Status Cache
//!
//! In-memory mapping from path to [`StatusRecord`] for one working-copy connection.
//! Mutations run under a single exclusive lock on the map and publish a
//! [`StatusEvent`] while that lock is held, so notifications for the same path
//! reach subscribers in mutation order. Reconciliation callbacks always run with
//! the lock released; they may insert into or remove from this same cache.

use super::events::{StatusEvent, StatusEvents, Subscription};
use super::record::{StatusData, StatusRecord};
use crate::error::BackendError;
use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of reconciling one record against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The backend reports this snapshot for the path
    Current(StatusData),
    /// The backend no longer knows the path; the entry is dropped
    Retired,
}

/// Per-item outcome of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Record replaced with a different snapshot
    Refreshed,
    /// Backend reported exactly the cached snapshot
    Unchanged,
    /// Entry removed because the backend no longer reports it
    Retired,
    /// Entry was already gone when its turn came (or vanished mid-reconcile)
    Vanished,
    /// Reconciliation failed; the previous record stays in place
    Degraded { error: String },
}

impl RefreshOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RefreshOutcome::Degraded { .. })
    }
}

/// Summary of a bulk refresh
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Number of passes started, including restarts
    pub passes: usize,
    /// False only when `max_passes` stopped a pass that kept changing membership
    pub converged: bool,
    /// Outcomes of the final pass, in visit order
    pub outcomes: Vec<(PathBuf, RefreshOutcome)>,
}

impl RefreshReport {
    pub fn degraded(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_degraded())
            .map(|(path, _)| path.as_path())
    }

    pub fn count(&self, wanted: &RefreshOutcome) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome == wanted)
            .count()
    }
}

struct Entries {
    map: HashMap<PathBuf, Arc<StatusRecord>>,
    /// Bumped whenever a key is added or removed
    epoch: u64,
}

/// Observable path -> status mapping
pub struct StatusCache {
    entries: RwLock<Entries>,
    events: StatusEvents,
    refresh_gate: ReentrantMutex<()>,
    max_passes: Option<usize>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                epoch: 0,
            }),
            events: StatusEvents::new(),
            refresh_gate: ReentrantMutex::new(()),
            max_passes: None,
        }
    }

    /// Stop a bulk refresh after `max_passes` passes even if membership keeps changing
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes.filter(|n| *n > 0);
        self
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.read().map.contains_key(path)
    }

    /// Current record for `path`, or the not-existing sentinel
    pub fn lookup(&self, path: &Path) -> Arc<StatusRecord> {
        let cached = self.entries.read().map.get(path).cloned();
        cached.unwrap_or_else(|| Arc::new(StatusRecord::not_existing(path)))
    }

    /// Point-in-time copy of every entry
    pub fn snapshot(&self) -> HashMap<PathBuf, Arc<StatusRecord>> {
        self.entries.read().map.clone()
    }

    /// Add or replace the entry for `record.path()`
    ///
    /// Returns whether the observable state changed; re-inserting an identical
    /// record publishes nothing.
    pub fn insert(&self, record: StatusRecord) -> bool {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.map.get(record.path()) {
            if **existing == record {
                return false;
            }
        }
        let path = record.path().to_path_buf();
        if entries.map.insert(path.clone(), Arc::new(record)).is_none() {
            entries.epoch += 1;
        }
        self.events.publish(StatusEvent::updated(path));
        true
    }

    /// Delete the entry if present and publish its removal
    pub fn remove(&self, path: &Path) -> Option<Arc<StatusRecord>> {
        let mut entries = self.entries.write();
        let removed = entries.map.remove(path)?;
        entries.epoch += 1;
        self.events.publish(StatusEvent::removed(path));
        Some(removed)
    }

    /// Re-evaluate a single cached entry
    pub fn refresh_one<F>(&self, path: &Path, mut reconcile: F) -> RefreshOutcome
    where
        F: FnMut(&StatusRecord) -> Result<Reconciled, BackendError>,
    {
        let _gate = self.refresh_gate.lock();
        self.refresh_entry(path, &mut reconcile)
    }

    /// Re-evaluate every cached entry until a full pass sees no membership change
    ///
    /// Each pass iterates a snapshot of the keys taken together with the
    /// membership epoch. If any key was added or removed while the pass ran,
    /// whether by `reconcile` itself or by another thread, the pass restarts
    /// from scratch. A restart therefore needs a net membership change, and
    /// the loop ends once reconciliation stops discovering or retiring paths.
    pub fn refresh_all<F>(&self, mut reconcile: F) -> RefreshReport
    where
        F: FnMut(&StatusRecord) -> Result<Reconciled, BackendError>,
    {
        let _gate = self.refresh_gate.lock();
        let mut report = RefreshReport::default();

        loop {
            report.passes += 1;
            let (epoch, keys) = {
                let entries = self.entries.read();
                let keys: Vec<PathBuf> = entries.map.keys().cloned().collect();
                (entries.epoch, keys)
            };

            report.outcomes = keys
                .into_iter()
                .map(|key| {
                    let outcome = self.refresh_entry(&key, &mut reconcile);
                    (key, outcome)
                })
                .collect();

            if self.entries.read().epoch == epoch {
                report.converged = true;
                break;
            }

            if let Some(max_passes) = self.max_passes {
                if report.passes >= max_passes {
                    warn!(
                        passes = report.passes,
                        "Bulk refresh stopped before membership settled"
                    );
                    break;
                }
            }

            debug!(
                pass = report.passes,
                "Cache membership changed during refresh, restarting pass"
            );
        }

        debug!(
            passes = report.passes,
            entries = report.outcomes.len(),
            degraded = report.degraded().count(),
            "Bulk refresh finished"
        );
        report
    }

    fn refresh_entry<F>(&self, path: &Path, reconcile: &mut F) -> RefreshOutcome
    where
        F: FnMut(&StatusRecord) -> Result<Reconciled, BackendError>,
    {
        let current = match self.entries.read().map.get(path).cloned() {
            Some(record) => record,
            None => return RefreshOutcome::Vanished,
        };

        // No lock held here: reconcile blocks on the backend and may re-enter the cache.
        let reconciled = match reconcile(&current) {
            Ok(reconciled) => reconciled,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to reconcile status, keeping previous record");
                return RefreshOutcome::Degraded {
                    error: e.to_string(),
                };
            }
        };

        let mut entries = self.entries.write();
        match reconciled {
            Reconciled::Current(data) => match entries.map.get_mut(path) {
                None => RefreshOutcome::Vanished,
                Some(existing) if existing.data() == &data => RefreshOutcome::Unchanged,
                Some(existing) => {
                    *existing = Arc::new(StatusRecord::new(path, data));
                    self.events.publish(StatusEvent::updated(path));
                    RefreshOutcome::Refreshed
                }
            },
            Reconciled::Retired => {
                if entries.map.remove(path).is_none() {
                    return RefreshOutcome::Vanished;
                }
                entries.epoch += 1;
                self.events.publish(StatusEvent::removed(path));
                RefreshOutcome::Retired
            }
        }
    }
}
