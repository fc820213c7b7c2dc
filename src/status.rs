//! Status domain: per-path records, the observable cache and its notifications.

mod cache;
mod events;
mod record;

pub use cache::{Reconciled, RefreshOutcome, RefreshReport, StatusCache};
pub use events::{StatusEvent, StatusEventKind, StatusEvents, Subscription};
pub use record::{NodeKind, StatusData, StatusEntry, StatusRecord, VersionState};
