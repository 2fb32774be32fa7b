//! Status and reasoning caches keyed by message order

use crate::models::StreamStatus;

use super::MessageStore;

impl MessageStore {
    pub fn update_status_cache(&mut self, order: i64, status: StreamStatus) {
        tracing::trace!(order, status = ?status, "Caching stream status");
        self.status_cache.insert(order, status);
    }

    pub fn get_cached_status(&self, order: i64) -> Option<StreamStatus> {
        self.status_cache.get(&order).copied()
    }

    pub fn update_reasoning_cache(&mut self, order: i64, reasoning: impl Into<String>) {
        let reasoning = reasoning.into();
        tracing::trace!(order, len = reasoning.len(), "Caching reasoning");
        self.reasoning_cache.insert(order, reasoning);
    }

    pub fn get_cached_reasoning(&self, order: i64) -> Option<&str> {
        self.reasoning_cache.get(&order).map(String::as_str)
    }

    /// Forget cached reasoning once the persisted row carries its own.
    ///
    /// Returns `true` if an entry was removed.
    pub fn clear_reasoning_cache(&mut self, order: i64) -> bool {
        let removed = self.reasoning_cache.remove(&order).is_some();
        if removed {
            tracing::debug!(thread_id = ?self.thread_id, order, "Cleared reasoning cache");
        }
        removed
    }
}
