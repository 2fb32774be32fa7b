//! Reactive query inputs: snapshot channels, delta bookkeeping and the poller.

mod delta_feed;
mod feeds;
mod poller;

pub use delta_feed::DeltaFeed;
pub use feeds::{SnapshotFeeds, SnapshotReceivers};
pub use poller::{backoff_delay, poll_once, PollOutcome, PollerHandle, QueryPoller, MAX_BACKOFF};
