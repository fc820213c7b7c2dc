//! Status change notifications and their subscriptions.

use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

/// What happened to the record at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusEventKind {
    /// Inserted or replaced; re-query the cache for the current record
    Updated,
    /// Retracted from the cache
    Removed,
}

/// Change notification carrying only the affected path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub path: PathBuf,
    pub kind: StatusEventKind,
}

impl StatusEvent {
    pub fn updated(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: StatusEventKind::Updated,
        }
    }

    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: StatusEventKind::Removed,
        }
    }
}

/// Receiving end of a subscription
///
/// Dropping it unsubscribes; the hub prunes the dead sender on its next publish.
pub struct Subscription {
    rx: mpsc::Receiver<StatusEvent>,
}

impl Subscription {
    /// Next event if one is already queued
    pub fn try_next(&self) -> Option<StatusEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn next_timeout(&self, timeout: Duration) -> Option<StatusEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain everything queued so far
    pub fn drain(&self) -> Vec<StatusEvent> {
        self.rx.try_iter().collect()
    }

    /// Blocking iterator that ends once the hub is dropped
    pub fn iter(&self) -> mpsc::Iter<'_, StatusEvent> {
        self.rx.iter()
    }
}

/// Fan-out hub for status events
#[derive(Default)]
pub struct StatusEvents {
    subscribers: Mutex<Vec<mpsc::Sender<StatusEvent>>>,
}

impl StatusEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        Subscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub(crate) fn publish(&self, event: StatusEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
