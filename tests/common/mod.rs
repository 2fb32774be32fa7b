//! Common test utilities for integration tests.
//!
//! Fixture builders for backend rows, stream metadata and deltas, plus a
//! helper that wires a [`ChatContext`] to a shared [`MockBackend`].
//!
//! # Example
//!
//! ```ignore
//! let (backend, mut chat) = mock_context("t1");
//! chat.apply_list_snapshot(list_snapshot("t1", vec![user_row("m1", "Hi", 0)]));
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use chatline::config::ChatConfig;
use chatline::context::ChatContext;
use chatline::models::{
    DeltaPart, DeltaSnapshot, ListSnapshot, MessageRole, RawMessage, StreamDelta,
    StreamMessageMeta, StreamStatus,
};

pub use chatline::adapters::mock::{MockBackend, RecordedCall, UploadBehavior};

/// Creation time of the row with order 0, in milliseconds
pub const BASE_TIME_MS: f64 = 1_700_000_000_000.0;

/// A persisted row one second after the previous order.
pub fn row(id: &str, role: MessageRole, text: &str, order: i64) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        creation_time: BASE_TIME_MS + order as f64 * 1000.0,
        order: Some(order),
        role: Some(role),
        text: Some(text.to_string()),
        ..RawMessage::default()
    }
}

pub fn user_row(id: &str, text: &str, order: i64) -> RawMessage {
    row(id, MessageRole::User, text, order)
}

pub fn assistant_row(id: &str, text: &str, order: i64) -> RawMessage {
    row(id, MessageRole::Assistant, text, order)
}

/// Assistant row that persisted its reasoning alongside the text.
pub fn assistant_row_with_reasoning(id: &str, text: &str, reasoning: &str, order: i64) -> RawMessage {
    RawMessage {
        reasoning: Some(reasoning.to_string()),
        ..assistant_row(id, text, order)
    }
}

pub fn list_snapshot(thread_id: &str, messages: Vec<RawMessage>) -> ListSnapshot {
    ListSnapshot {
        thread_id: Some(thread_id.to_string()),
        messages,
        streams: None,
        is_done: true,
    }
}

pub fn stream_meta(stream_id: &str, order: i64, status: StreamStatus) -> StreamMessageMeta {
    StreamMessageMeta {
        stream_id: stream_id.to_string(),
        order,
        status,
        creation_time: None,
    }
}

pub fn text_delta(stream_id: &str, start: u64, text: &str) -> StreamDelta {
    StreamDelta {
        stream_id: stream_id.to_string(),
        start,
        end: start + 1,
        parts: vec![DeltaPart::TextDelta {
            text: text.to_string(),
        }],
    }
}

pub fn reasoning_delta(stream_id: &str, start: u64, text: &str) -> StreamDelta {
    StreamDelta {
        stream_id: stream_id.to_string(),
        start,
        end: start + 1,
        parts: vec![DeltaPart::ReasoningDelta {
            text: text.to_string(),
        }],
    }
}

pub fn delta_snapshot(
    thread_id: &str,
    streams: Vec<StreamMessageMeta>,
    deltas: Vec<StreamDelta>,
) -> DeltaSnapshot {
    DeltaSnapshot {
        thread_id: Some(thread_id.to_string()),
        streams,
        deltas,
    }
}

pub fn no_deltas(thread_id: &str) -> DeltaSnapshot {
    DeltaSnapshot::empty(Some(thread_id.to_string()))
}

/// A context bound to `thread_id` and the backend handle that drives it.
pub fn mock_context(thread_id: &str) -> (MockBackend, ChatContext) {
    mock_context_with(thread_id, ChatConfig::default())
}

pub fn mock_context_with(thread_id: &str, config: ChatConfig) -> (MockBackend, ChatContext) {
    let backend = MockBackend::new();
    let context = ChatContext::for_thread(Arc::new(backend.clone()), config, thread_id);
    (backend, context)
}
