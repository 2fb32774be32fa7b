//! Thread identity and send-phase tracking for MessageStore

use super::MessageStore;

/// Where the current thread is in a send/response cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadPhase {
    #[default]
    Idle,
    /// An optimistic message exists that no list snapshot has confirmed yet
    Sending,
    /// The user message is persisted, the response has not shown up yet
    AwaitingStream,
}

impl MessageStore {
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Switch the store to another thread.
    ///
    /// Any change away from a known thread resets the optimistic buffer and
    /// both caches. Going from no thread to a freshly created one keeps them,
    /// since that is the first message of a conversation creating its thread.
    /// Returns `true` when a reset happened.
    pub fn set_thread(&mut self, thread_id: Option<String>) -> bool {
        if self.thread_id == thread_id {
            return false;
        }

        let reset = self.thread_id.is_some();
        if reset {
            tracing::debug!(
                from = ?self.thread_id,
                to = ?thread_id,
                "Thread changed, resetting message store"
            );
            self.reset();
        }
        self.thread_id = thread_id;
        reset
    }

    pub fn phase(&self) -> ThreadPhase {
        self.phase
    }

    /// True while a response is expected but nothing visible has arrived.
    pub fn is_awaiting(&self) -> bool {
        self.phase != ThreadPhase::Idle
    }

    pub(crate) fn set_phase(&mut self, phase: ThreadPhase) {
        if self.phase != phase {
            tracing::debug!(thread_id = ?self.thread_id, from = ?self.phase, to = ?phase, "Phase change");
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptimisticMessage, StreamStatus};
    use chrono::Utc;

    fn store_with_state(thread_id: Option<&str>) -> MessageStore {
        let mut store = MessageStore {
            thread_id: thread_id.map(str::to_string),
            ..MessageStore::default()
        };
        store.add_optimistic_message(OptimisticMessage::user("Hi", Vec::new(), Utc::now()));
        store.update_status_cache(2, StreamStatus::Streaming);
        store.update_reasoning_cache(2, "hmm");
        store
    }

    #[test]
    fn test_first_thread_keeps_buffer() {
        let mut store = store_with_state(None);

        let reset = store.set_thread(Some("t1".to_string()));

        assert!(!reset);
        assert_eq!(store.thread_id(), Some("t1"));
        assert_eq!(store.optimistic_messages().len(), 1);
        assert_eq!(store.get_cached_reasoning(2), Some("hmm"));
    }

    #[test]
    fn test_switching_threads_resets() {
        let mut store = store_with_state(Some("t1"));

        let reset = store.set_thread(Some("t2".to_string()));

        assert!(reset);
        assert_eq!(store.thread_id(), Some("t2"));
        assert!(store.optimistic_messages().is_empty());
        assert!(store.get_cached_status(2).is_none());
    }

    #[test]
    fn test_leaving_thread_resets() {
        let mut store = store_with_state(Some("t1"));
        assert!(store.set_thread(None));
        assert!(store.optimistic_messages().is_empty());
    }

    #[test]
    fn test_same_thread_is_noop() {
        let mut store = store_with_state(Some("t1"));
        let revision = store.revision();

        assert!(!store.set_thread(Some("t1".to_string())));
        assert_eq!(store.revision(), revision);
        assert_eq!(store.optimistic_messages().len(), 1);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut store = store_with_state(Some("t1"));
        store.set_phase(ThreadPhase::AwaitingStream);
        assert!(store.is_awaiting());

        store.set_thread(Some("t2".to_string()));
        assert_eq!(store.phase(), ThreadPhase::Idle);
    }
}
