//! Per-thread message store
//!
//! Holds the optimistic buffer and the status/reasoning caches that bridge
//! gaps between query refreshes. Only the display coordinator writes the
//! caches, during a merge pass.

mod optimistic;
mod stream_cache;
mod thread;

use std::collections::HashMap;

use crate::models::{OptimisticMessage, StreamStatus};

pub use thread::ThreadPhase;

/// State for the conversation currently on screen
#[derive(Debug, Default)]
pub struct MessageStore {
    /// Active thread; `None` until the first send creates one
    pub(crate) thread_id: Option<String>,
    /// Messages sent locally and not yet seen in a list snapshot
    pub(crate) optimistic: Vec<OptimisticMessage>,
    /// Last-known stream status per message order
    pub(crate) status_cache: HashMap<i64, StreamStatus>,
    /// Last-known streamed reasoning per message order
    pub(crate) reasoning_cache: HashMap<i64, String>,
    pub(crate) phase: ThreadPhase,
    /// Bumped whenever the optimistic buffer changes
    pub(crate) revision: u64,
    /// Bumped whenever the store is reset for another thread
    pub(crate) epoch: u64,
}

impl MessageStore {
    /// Create an empty store with no thread yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already bound to a thread
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }

    /// Revision of the optimistic buffer, for memoization
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Reset counter, for memoization
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drop the buffer, both caches and the send phase.
    pub(crate) fn reset(&mut self) {
        self.optimistic.clear();
        self.status_cache.clear();
        self.reasoning_cache.clear();
        self.phase = ThreadPhase::Idle;
        self.revision += 1;
        self.epoch += 1;
    }
}
