//! Per-message display field resolution.
//!
//! Live stream data wins over persisted content, persisted content wins over
//! the caches. Every live observation is written back to the caches so the
//! next refresh gap can fall back on it.

use crate::cache::MessageStore;
use crate::models::{
    DisplayMessage, Message, MessageRole, PersistedStatus, StreamState, StreamStatus,
};
use crate::normalize::extract_user_text;

/// Resolve display text, reasoning and streaming flag for one message.
///
/// `live` is the stream state for the message's order, when the delta query
/// currently reports one.
pub(crate) fn resolve_fields(
    store: &mut MessageStore,
    message: Message,
    live: Option<&StreamState>,
) -> DisplayMessage {
    if message.role != MessageRole::Assistant {
        let display_text = match message.role {
            MessageRole::User => extract_user_text(&message),
            _ => message.text.clone(),
        };
        return DisplayMessage {
            display_reasoning: message.reasoning.clone(),
            display_text,
            is_streaming: false,
            has_reasoning_stream: false,
            message,
        };
    }

    let Some(order) = message.order else {
        return DisplayMessage {
            display_text: message.text.clone(),
            display_reasoning: message.reasoning.clone(),
            is_streaming: false,
            has_reasoning_stream: false,
            message,
        };
    };

    match message.status {
        PersistedStatus::Success => store.update_status_cache(order, StreamStatus::Finished),
        PersistedStatus::Failed => store.update_status_cache(order, StreamStatus::Aborted),
        PersistedStatus::Pending => {}
    }

    if let Some(stream) = live {
        store.update_status_cache(order, stream.status);
        if !stream.reasoning.is_empty() {
            store.update_reasoning_cache(order, stream.reasoning.clone());
        }
    }

    let display_text = match live {
        Some(stream) if !stream.text.is_empty() => stream.text.clone(),
        _ => message.text.clone(),
    };

    let live_reasoning = live.map(|s| s.reasoning.as_str()).unwrap_or_default();
    let (display_reasoning, has_reasoning_stream) = if !live_reasoning.is_empty() {
        (live_reasoning.to_string(), true)
    } else if !message.reasoning.is_empty() {
        store.clear_reasoning_cache(order);
        (message.reasoning.clone(), false)
    } else if let Some(cached) = store.get_cached_reasoning(order) {
        (cached.to_string(), true)
    } else {
        (String::new(), false)
    };

    let is_streaming = match live {
        Some(stream) => stream.is_streaming(),
        None => store.get_cached_status(order) == Some(StreamStatus::Streaming),
    };

    DisplayMessage {
        message,
        display_text,
        display_reasoning,
        is_streaming,
        has_reasoning_stream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageContent;
    use chrono::DateTime;

    fn assistant(order: i64, text: &str, reasoning: &str, status: PersistedStatus) -> Message {
        Message {
            id: format!("m{}", order),
            role: MessageRole::Assistant,
            order: Some(order),
            creation_time: DateTime::UNIX_EPOCH,
            content: MessageContent::Text(text.to_string()),
            text: text.to_string(),
            reasoning: reasoning.to_string(),
            status,
            metadata: None,
            local_attachments: Vec::new(),
            is_optimistic: false,
        }
    }

    fn live(order: i64, text: &str, reasoning: &str) -> StreamState {
        StreamState {
            stream_id: "s".to_string(),
            order,
            status: StreamStatus::Streaming,
            text: text.to_string(),
            reasoning: reasoning.to_string(),
            cursor: 1,
            creation_time: None,
        }
    }

    #[test]
    fn test_live_reasoning_wins_over_cache() {
        let mut store = MessageStore::new();
        store.update_reasoning_cache(1, "B");

        let msg = assistant(1, "", "", PersistedStatus::Pending);
        let out = resolve_fields(&mut store, msg, Some(&live(1, "", "A")));

        assert_eq!(out.display_reasoning, "A");
        assert!(out.has_reasoning_stream);
        assert_eq!(store.get_cached_reasoning(1), Some("A"));
    }

    #[test]
    fn test_cached_reasoning_when_nothing_else() {
        let mut store = MessageStore::new();
        store.update_reasoning_cache(1, "B");

        let msg = assistant(1, "", "", PersistedStatus::Pending);
        let out = resolve_fields(&mut store, msg, None);

        assert_eq!(out.display_reasoning, "B");
        assert!(out.has_reasoning_stream);
    }

    #[test]
    fn test_persisted_reasoning_wins_and_clears_cache() {
        let mut store = MessageStore::new();
        store.update_reasoning_cache(1, "B");

        let msg = assistant(1, "done", "C", PersistedStatus::Success);
        let out = resolve_fields(&mut store, msg, None);

        assert_eq!(out.display_reasoning, "C");
        assert!(!out.has_reasoning_stream);
        assert!(store.get_cached_reasoning(1).is_none());
    }

    #[test]
    fn test_live_text_overrides_persisted() {
        let mut store = MessageStore::new();
        let msg = assistant(1, "partial", "", PersistedStatus::Pending);

        let out = resolve_fields(&mut store, msg, Some(&live(1, "partial and more", "")));
        assert_eq!(out.display_text, "partial and more");
        assert!(out.is_streaming);
    }

    #[test]
    fn test_empty_live_text_falls_back_to_persisted() {
        let mut store = MessageStore::new();
        let msg = assistant(1, "persisted", "", PersistedStatus::Pending);

        let out = resolve_fields(&mut store, msg, Some(&live(1, "", "")));
        assert_eq!(out.display_text, "persisted");
    }

    #[test]
    fn test_cached_status_bridges_gap() {
        let mut store = MessageStore::new();
        let msg = assistant(1, "", "", PersistedStatus::Pending);
        resolve_fields(&mut store, msg.clone(), Some(&live(1, "x", "")));

        let out = resolve_fields(&mut store, msg, None);
        assert!(out.is_streaming);
    }

    #[test]
    fn test_persisted_success_ends_streaming() {
        let mut store = MessageStore::new();
        store.update_status_cache(1, StreamStatus::Streaming);

        let msg = assistant(1, "done", "", PersistedStatus::Success);
        let out = resolve_fields(&mut store, msg, None);

        assert!(!out.is_streaming);
        assert_eq!(store.get_cached_status(1), Some(StreamStatus::Finished));
    }

    #[test]
    fn test_user_message_ignores_stream() {
        let mut store = MessageStore::new();
        let mut msg = assistant(1, "my question", "", PersistedStatus::Success);
        msg.role = MessageRole::User;

        let out = resolve_fields(&mut store, msg, Some(&live(1, "stream text", "r")));
        assert_eq!(out.display_text, "my question");
        assert_eq!(out.display_reasoning, "");
        assert!(!out.is_streaming);
        assert!(store.get_cached_reasoning(1).is_none());
    }
}
