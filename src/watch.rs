//! Watch feed: filesystem change events for a working copy.

mod events;
mod feed;

pub(crate) use events::EventBatcher;
pub use events::{convert_event, WatchEvent};
pub use feed::{FeedPoll, WatchFeed};
