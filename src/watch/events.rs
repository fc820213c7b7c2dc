//! Watch events, conversion from raw notify events, and per-path batching.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Filesystem change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl WatchEvent {
    /// Path the event is keyed on; the destination for renames
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Modified(p) | WatchEvent::Removed(p) => p,
            WatchEvent::Renamed { to, .. } => to,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            WatchEvent::Created(_) => "created",
            WatchEvent::Modified(_) => "modified",
            WatchEvent::Removed(_) => "removed",
            WatchEvent::Renamed { .. } => "renamed",
        }
    }
}

/// Translate one notify event into watch events
///
/// Renames reported with both halves become a single `Renamed`; a lone half
/// is reported as the removal or creation it looks like from the outside.
pub fn convert_event(event: Event) -> Vec<WatchEvent> {
    let mut paths = event.paths.into_iter();
    match event.kind {
        EventKind::Create(_) => paths.map(WatchEvent::Created).collect(),
        EventKind::Remove(_) => paths.map(WatchEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.map(WatchEvent::Removed).collect(),
            RenameMode::To => paths.map(WatchEvent::Created).collect(),
            _ => match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => vec![WatchEvent::Renamed { from, to }],
                (Some(only), None) => vec![WatchEvent::Modified(only)],
                _ => Vec::new(),
            },
        },
        EventKind::Modify(_) => paths.map(WatchEvent::Modified).collect(),
        _ => Vec::new(),
    }
}

/// Collapses repeated events for the same path within one batch window
///
/// A later plain event for a path overwrites the earlier one in place, so the
/// batch keeps first-seen order across paths. Renames always get their own
/// slot and reset tracking for both of their paths, which keeps any later event
/// for either path after the rename.
#[derive(Default)]
pub(crate) struct EventBatcher {
    max_batch_size: usize,
    pending: Vec<WatchEvent>,
    slots: HashMap<PathBuf, usize>,
}

impl EventBatcher {
    pub(crate) fn new(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            pending: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Queue an event; returns true once the batch is full
    pub(crate) fn add_event(&mut self, event: WatchEvent) -> bool {
        match &event {
            WatchEvent::Renamed { from, to } => {
                self.slots.remove(from);
                self.slots.remove(to);
                self.pending.push(event);
            }
            _ => {
                let path = event.path().to_path_buf();
                match self.slots.get(&path) {
                    Some(&slot) => self.pending[slot] = event,
                    None => {
                        self.slots.insert(path, self.pending.len());
                        self.pending.push(event);
                    }
                }
            }
        }
        self.pending.len() >= self.max_batch_size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn take_batch(&mut self) -> Vec<WatchEvent> {
        self.slots.clear();
        std::mem::take(&mut self.pending)
    }
}
