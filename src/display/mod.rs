//! Display coordinator
//!
//! Combines the list snapshot, the delta snapshot and the store's optimistic
//! buffer into the list the UI renders. The pass never fails: a stale or
//! partial snapshot just yields a partial list until the next refresh.

mod fields;
mod merge;
mod reasoning_panel;

use std::sync::Arc;

use crate::cache::{MessageStore, ThreadPhase};
use crate::models::{
    DeltaSnapshot, DisplayKey, DisplayMessage, ListSnapshot, StreamState, StreamStatus,
};
use crate::normalize::normalize;
use crate::stream_deltas::derive_streaming_messages;

pub use merge::{append_stream_placeholders, merge_messages, MergeOutcome};
pub use reasoning_panel::ReasoningPanels;

/// Inputs of the last pass, compared by identity
#[derive(Debug)]
struct MemoKey {
    list: Arc<ListSnapshot>,
    deltas: Arc<DeltaSnapshot>,
    revision: u64,
    epoch: u64,
}

impl MemoKey {
    fn matches(
        &self,
        list: &Arc<ListSnapshot>,
        deltas: &Arc<DeltaSnapshot>,
        store: &MessageStore,
    ) -> bool {
        Arc::ptr_eq(&self.list, list)
            && Arc::ptr_eq(&self.deltas, deltas)
            && self.revision == store.revision()
            && self.epoch == store.epoch()
    }
}

/// Owns the derived display list and the state derived alongside it
#[derive(Debug, Default)]
pub struct DisplayCoordinator {
    messages: Vec<DisplayMessage>,
    /// Stream state from the previous pass, extended incrementally
    streams: Vec<StreamState>,
    panels: ReasoningPanels,
    memo: Option<MemoKey>,
    epoch: u64,
}

impl DisplayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute if any input changed since the last call.
    ///
    /// Returns `true` when a pass ran.
    pub fn update(
        &mut self,
        store: &mut MessageStore,
        list: &Arc<ListSnapshot>,
        deltas: &Arc<DeltaSnapshot>,
    ) -> bool {
        if self
            .memo
            .as_ref()
            .is_some_and(|memo| memo.matches(list, deltas, store))
        {
            return false;
        }

        self.recompute(store, list, deltas);
        self.memo = Some(MemoKey {
            list: Arc::clone(list),
            deltas: Arc::clone(deltas),
            revision: store.revision(),
            epoch: store.epoch(),
        });
        true
    }

    /// Run a full merge pass regardless of the memo.
    pub fn recompute(
        &mut self,
        store: &mut MessageStore,
        list: &ListSnapshot,
        deltas: &DeltaSnapshot,
    ) -> &[DisplayMessage] {
        if store.epoch() != self.epoch {
            self.streams.clear();
            self.panels.clear();
            self.epoch = store.epoch();
        }

        let thread_id = store.thread_id().map(str::to_string);
        let list_current = list.thread_id == thread_id;
        let deltas_current = deltas.thread_id == thread_id;
        if !list_current || !deltas_current {
            tracing::debug!(
                thread_id = ?thread_id,
                list_thread = ?list.thread_id,
                delta_thread = ?deltas.thread_id,
                "Ignoring snapshot for another thread"
            );
        }

        let persisted: Vec<_> = if list_current {
            list.messages.iter().map(normalize).collect()
        } else {
            Vec::new()
        };

        let outcome = merge_messages(&persisted, store.optimistic_messages());
        let mut merged = outcome.messages;
        if !outcome.superseded.is_empty() {
            store.discard_superseded(&outcome.superseded);
            if store.phase() == ThreadPhase::Sending && store.optimistic_messages().is_empty() {
                store.set_phase(ThreadPhase::AwaitingStream);
            }
        }

        let active = deltas_current && deltas.has_streams();
        if active {
            self.streams = derive_streaming_messages(
                thread_id.as_deref().unwrap_or_default(),
                &deltas.streams,
                &self.streams,
                &deltas.deltas,
            );
            append_stream_placeholders(&mut merged, &self.streams);
        } else {
            self.streams.clear();
        }

        let mut rows = Vec::with_capacity(merged.len());
        for message in merged {
            let live = message
                .order
                .and_then(|order| self.streams.iter().find(|s| s.order == order));
            rows.push(fields::resolve_fields(store, message, live));
        }

        for message in &rows {
            self.panels.observe(message);
        }

        let stream_live = (deltas_current && deltas.has_live_stream())
            || (list_current
                && list
                    .streams
                    .iter()
                    .flatten()
                    .any(|s| s.status == StreamStatus::Streaming));
        let answered = rows.last().is_some_and(DisplayMessage::is_filled_assistant);
        if store.phase() != ThreadPhase::Idle && (stream_live || answered) {
            store.set_phase(ThreadPhase::Idle);
        }

        tracing::debug!(
            thread_id = ?thread_id,
            messages = rows.len(),
            streams = self.streams.len(),
            "Recomputed display list"
        );

        self.messages = rows;
        &self.messages
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    /// Stream state derived on the last pass, ascending by order
    pub fn streams(&self) -> &[StreamState] {
        &self.streams
    }

    pub fn is_reasoning_open(&self, key: &DisplayKey) -> bool {
        self.panels.is_open(key)
    }

    pub fn toggle_reasoning(&mut self, key: &DisplayKey) -> bool {
        self.panels.toggle(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DeltaPart, MessageRole, OptimisticMessage, RawMessage, StreamDelta, StreamMessageMeta,
    };
    use chrono::Utc;

    fn row(id: &str, role: MessageRole, text: &str, order: i64) -> RawMessage {
        RawMessage {
            id: id.to_string(),
            creation_time: 1_700_000_000_000.0 + order as f64 * 1000.0,
            order: Some(order),
            role: Some(role),
            text: Some(text.to_string()),
            ..RawMessage::default()
        }
    }

    fn list(rows: Vec<RawMessage>) -> Arc<ListSnapshot> {
        Arc::new(ListSnapshot {
            thread_id: Some("t1".to_string()),
            messages: rows,
            streams: None,
            is_done: true,
        })
    }

    fn streaming(order: i64, text: &str) -> Arc<DeltaSnapshot> {
        Arc::new(DeltaSnapshot {
            thread_id: Some("t1".to_string()),
            streams: vec![StreamMessageMeta {
                stream_id: "s1".to_string(),
                order,
                status: StreamStatus::Streaming,
                creation_time: None,
            }],
            deltas: vec![StreamDelta {
                stream_id: "s1".to_string(),
                start: 0,
                end: 1,
                parts: vec![DeltaPart::TextDelta {
                    text: text.to_string(),
                }],
            }],
        })
    }

    fn no_deltas() -> Arc<DeltaSnapshot> {
        Arc::new(DeltaSnapshot::empty(Some("t1".to_string())))
    }

    #[test]
    fn test_memo_skips_unchanged_inputs() {
        let mut store = MessageStore::for_thread("t1");
        let mut coordinator = DisplayCoordinator::new();
        let list = list(vec![row("m1", MessageRole::User, "Hi", 0)]);
        let deltas = no_deltas();

        assert!(coordinator.update(&mut store, &list, &deltas));
        assert!(!coordinator.update(&mut store, &list, &deltas));

        store.add_optimistic_message(OptimisticMessage::user("Next", Vec::new(), Utc::now()));
        assert!(coordinator.update(&mut store, &list, &deltas));
        assert_eq!(coordinator.messages().len(), 2);
    }

    #[test]
    fn test_snapshot_for_other_thread_is_ignored() {
        let mut store = MessageStore::for_thread("t2");
        let mut coordinator = DisplayCoordinator::new();

        coordinator.update(&mut store, &list(vec![row("m1", MessageRole::User, "Hi", 0)]), &no_deltas());
        assert!(coordinator.messages().is_empty());
    }

    #[test]
    fn test_confirmation_moves_to_awaiting_then_idle() {
        let mut store = MessageStore::for_thread("t1");
        let mut coordinator = DisplayCoordinator::new();
        store.add_optimistic_message(OptimisticMessage::user("Hi", Vec::new(), Utc::now()));
        assert_eq!(store.phase(), ThreadPhase::Sending);

        coordinator.update(&mut store, &list(vec![row("m1", MessageRole::User, "Hi", 0)]), &no_deltas());
        assert_eq!(store.phase(), ThreadPhase::AwaitingStream);
        assert!(store.optimistic_messages().is_empty());

        coordinator.update(
            &mut store,
            &list(vec![row("m1", MessageRole::User, "Hi", 0)]),
            &streaming(1, "Hel"),
        );
        assert_eq!(store.phase(), ThreadPhase::Idle);
    }

    #[test]
    fn test_filled_assistant_ends_awaiting() {
        let mut store = MessageStore::for_thread("t1");
        let mut coordinator = DisplayCoordinator::new();
        store.add_optimistic_message(OptimisticMessage::user("Hi", Vec::new(), Utc::now()));

        coordinator.update(
            &mut store,
            &list(vec![
                row("m1", MessageRole::User, "Hi", 0),
                row("m2", MessageRole::Assistant, "Hello", 1),
            ]),
            &no_deltas(),
        );
        assert_eq!(store.phase(), ThreadPhase::Idle);
    }

    #[test]
    fn test_stream_placeholder_then_persisted() {
        let mut store = MessageStore::for_thread("t1");
        let mut coordinator = DisplayCoordinator::new();
        let base = vec![row("m1", MessageRole::User, "Hi", 0)];

        coordinator.update(&mut store, &list(base.clone()), &streaming(1, "Hel"));
        let last = coordinator.messages().last().cloned();
        assert_eq!(last.as_ref().map(|m| m.display_text.as_str()), Some("Hel"));
        assert_eq!(last.as_ref().map(DisplayMessage::key), Some(DisplayKey::Order(1)));

        let mut persisted = base;
        persisted.push(row("m2", MessageRole::Assistant, "Hello", 1));
        coordinator.update(&mut store, &list(persisted), &no_deltas());

        assert_eq!(coordinator.messages().len(), 2);
        assert_eq!(coordinator.messages()[1].display_text, "Hello");
        assert_eq!(coordinator.messages()[1].key(), DisplayKey::Order(1));
    }

    #[test]
    fn test_thread_switch_drops_stream_state() {
        let mut store = MessageStore::for_thread("t1");
        let mut coordinator = DisplayCoordinator::new();
        coordinator.update(&mut store, &list(Vec::new()), &streaming(0, "x"));
        assert_eq!(coordinator.streams().len(), 1);

        store.set_thread(Some("t2".to_string()));
        coordinator.update(&mut store, &list(Vec::new()), &streaming(0, "x"));
        assert!(coordinator.streams().is_empty());
        assert!(coordinator.messages().is_empty());
    }

    #[test]
    fn test_recompute_under_debug_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut store = MessageStore::for_thread("t1");
            let mut coordinator = DisplayCoordinator::new();
            let rows = coordinator.recompute(
                &mut store,
                &list(vec![row("m1", MessageRole::User, "Hi", 0)]),
                &streaming(1, "Hel"),
            );
            assert_eq!(rows.len(), 2);
        });
    }
}
