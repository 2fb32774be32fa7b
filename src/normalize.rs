//! Message normalization.
//!
//! Turns the heterogeneous rows handed over by the list query (and the
//! optimistic buffer) into one canonical [`Message`] shape, and extracts the
//! user-visible text and reasoning from structured content. Nothing in here
//! fails: malformed input degrades to empty text or reasoning.

use chrono::{DateTime, Utc};

use crate::models::{
    ContentPart, Message, MessageContent, MessageMetadata, MessageRole, PersistedStatus,
    RawMessage,
};

/// Normalize a raw backend row into the canonical message shape.
///
/// The role falls back to the nested `message.role`; rows with no role at all
/// are treated as assistant output so they never masquerade as user input.
/// Content falls back from `content` to `message.content` to the flat `text`
/// field.
pub fn normalize(raw: &RawMessage) -> Message {
    let role = raw
        .role
        .or_else(|| raw.message.as_ref().and_then(|m| m.role))
        .unwrap_or_else(|| {
            tracing::warn!(message_id = %raw.id, "Row has no role, treating it as assistant");
            MessageRole::Assistant
        });

    let content_value = raw
        .content
        .as_ref()
        .or_else(|| raw.message.as_ref().and_then(|m| m.content.as_ref()));

    let content = match content_value {
        Some(value) => parse_content(value),
        None => MessageContent::Text(raw.text.clone().unwrap_or_default()),
    };

    let mut text = extract_text(&content);
    if text.is_empty() {
        if let Some(flat) = raw.text.as_deref() {
            text = flat.to_string();
        }
    }

    let mut reasoning = extract_reasoning(content.parts());
    if reasoning.is_empty() {
        reasoning = raw.reasoning.clone().unwrap_or_default();
    }

    let metadata = if raw.provider.is_some() || raw.provider_metadata.is_some() {
        Some(MessageMetadata {
            provider: raw.provider.clone(),
            fields: raw
                .provider_metadata
                .clone()
                .unwrap_or(serde_json::Value::Null),
        })
    } else {
        None
    };

    let id = if raw.id.is_empty() {
        synthetic_id(raw)
    } else {
        raw.id.clone()
    };

    Message {
        id,
        role,
        order: raw.order,
        creation_time: creation_time_from_millis(raw.creation_time),
        content,
        text,
        reasoning,
        status: raw.status.unwrap_or(PersistedStatus::Pending),
        metadata,
        local_attachments: Vec::new(),
        is_optimistic: false,
    }
}

/// Parse stored content leniently.
///
/// A string becomes flat text, an array becomes parts with any part that
/// fails to deserialize dropped. Anything else is empty text.
pub fn parse_content(value: &serde_json::Value) -> MessageContent {
    match value {
        serde_json::Value::String(text) => MessageContent::Text(text.clone()),
        serde_json::Value::Array(items) => {
            let parts = items
                .iter()
                .filter_map(|item| match serde_json::from_value::<ContentPart>(item.clone()) {
                    Ok(part) => Some(part),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping malformed content part");
                        None
                    }
                })
                .collect();
            MessageContent::Parts(parts)
        }
        serde_json::Value::Null => MessageContent::Text(String::new()),
        other => {
            tracing::warn!(kind = %json_kind(other), "Unexpected content shape, using empty text");
            MessageContent::Text(String::new())
        }
    }
}

/// Concatenate all text parts (or return the flat string).
pub fn extract_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect(),
    }
}

/// Text of a user message: text parts only, attachment parts skipped.
///
/// Never looks at stream state; a user row always shows its own content.
pub fn extract_user_text(message: &Message) -> String {
    let from_content = extract_text(&message.content);
    if from_content.is_empty() {
        message.text.clone()
    } else {
        from_content
    }
}

/// Text of the first reasoning part, or empty when there is none.
pub fn extract_reasoning(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .find_map(|part| match part {
            ContentPart::Reasoning { text } => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Convert backend epoch milliseconds, clamping garbage to the epoch.
pub fn creation_time_from_millis(millis: f64) -> DateTime<Utc> {
    if !millis.is_finite() {
        return DateTime::UNIX_EPOCH;
    }
    DateTime::from_timestamp_millis(millis as i64).unwrap_or(DateTime::UNIX_EPOCH)
}

fn synthetic_id(raw: &RawMessage) -> String {
    match raw.order {
        Some(order) => format!("order-{}", order),
        None => format!("row-{}", raw.creation_time as i64),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
