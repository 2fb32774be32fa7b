//! Watch channels publishing the two query snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{DeltaSnapshot, ListSnapshot};

/// Publishing half of the snapshot channels.
///
/// Each publish replaces the snapshot with a fresh `Arc` only when the content
/// differs, so subscribers can compare snapshots by pointer.
#[derive(Debug)]
pub struct SnapshotFeeds {
    list_tx: watch::Sender<Arc<ListSnapshot>>,
    delta_tx: watch::Sender<Arc<DeltaSnapshot>>,
}

/// Subscribing half of the snapshot channels
#[derive(Debug, Clone)]
pub struct SnapshotReceivers {
    pub list: watch::Receiver<Arc<ListSnapshot>>,
    pub deltas: watch::Receiver<Arc<DeltaSnapshot>>,
}

impl SnapshotFeeds {
    /// Create feeds seeded with empty snapshots for `thread_id`.
    pub fn new(thread_id: Option<String>) -> (Self, SnapshotReceivers) {
        let (list_tx, list_rx) = watch::channel(Arc::new(ListSnapshot::empty(thread_id.clone())));
        let (delta_tx, delta_rx) = watch::channel(Arc::new(DeltaSnapshot::empty(thread_id)));
        (
            Self { list_tx, delta_tx },
            SnapshotReceivers {
                list: list_rx,
                deltas: delta_rx,
            },
        )
    }

    /// Publish a list snapshot. Returns `true` if it differed from the last one.
    pub fn publish_list(&self, snapshot: ListSnapshot) -> bool {
        self.list_tx.send_if_modified(|current| {
            if **current == snapshot {
                false
            } else {
                *current = Arc::new(snapshot);
                true
            }
        })
    }

    /// Publish a delta snapshot. Returns `true` if it differed from the last one.
    pub fn publish_deltas(&self, snapshot: DeltaSnapshot) -> bool {
        self.delta_tx.send_if_modified(|current| {
            if **current == snapshot {
                false
            } else {
                *current = Arc::new(snapshot);
                true
            }
        })
    }

    pub fn subscribe(&self) -> SnapshotReceivers {
        SnapshotReceivers {
            list: self.list_tx.subscribe(),
            deltas: self.delta_tx.subscribe(),
        }
    }

    /// True once every receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.list_tx.is_closed() && self.delta_tx.is_closed()
    }
}

impl SnapshotReceivers {
    /// Current snapshots, marking both as seen.
    pub fn latest(&mut self) -> (Arc<ListSnapshot>, Arc<DeltaSnapshot>) {
        (
            Arc::clone(&self.list.borrow_and_update()),
            Arc::clone(&self.deltas.borrow_and_update()),
        )
    }

    /// True if either snapshot changed since the last [`Self::latest`].
    pub fn has_changed(&self) -> bool {
        self.list.has_changed().unwrap_or(false) || self.deltas.has_changed().unwrap_or(false)
    }
}
