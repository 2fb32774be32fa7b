//! Persisted/optimistic merge and stream placeholders.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    Message, MessageContent, MessageRole, OptimisticMessage, PersistedStatus, StreamState,
};
use crate::normalize::extract_user_text;

/// Result of merging one list page with the optimistic buffer
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Merged messages, ascending by creation time
    pub messages: Vec<Message>,
    /// Ids of optimistic messages a persisted row now stands in for
    pub superseded: Vec<String>,
}

/// Merge normalized persisted messages with the optimistic buffer.
///
/// Persisted rows are keyed by id, a later row replacing an earlier one with
/// the same id. An optimistic message is superseded when a persisted message
/// has the same role and identical extracted text; otherwise it is kept under
/// its own id. The result is stably sorted by creation time, so rows with the
/// same timestamp keep page order and optimistic messages follow persisted
/// ones.
pub fn merge_messages(persisted: &[Message], optimistic: &[OptimisticMessage]) -> MergeOutcome {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(persisted.len());
    let mut messages: Vec<Message> = Vec::with_capacity(persisted.len() + optimistic.len());

    for message in persisted {
        match index.get(&message.id) {
            Some(&pos) => messages[pos] = message.clone(),
            None => {
                index.insert(message.id.clone(), messages.len());
                messages.push(message.clone());
            }
        }
    }

    let mut superseded = Vec::new();
    for pending in optimistic {
        let confirmed = persisted
            .iter()
            .any(|m| m.role == pending.role && extract_user_text(m) == pending.text);
        if confirmed {
            superseded.push(pending.id.clone());
            continue;
        }
        if !index.contains_key(&pending.id) {
            index.insert(pending.id.clone(), messages.len());
            messages.push(pending.to_message());
        }
    }

    messages.sort_by_key(|m| m.creation_time);

    MergeOutcome {
        messages,
        superseded,
    }
}

/// Add an assistant row for every stream whose order has no message yet.
///
/// The row uses the stream id as its id. Its creation time comes from the
/// stream metadata, else the newest existing message, else the epoch, so a
/// recompute over the same inputs places it identically.
pub fn append_stream_placeholders(messages: &mut Vec<Message>, streams: &[StreamState]) {
    let mut latest: Option<DateTime<Utc>> = messages.iter().map(|m| m.creation_time).max();
    let mut added = false;

    for stream in streams {
        let covered = messages.iter().any(|m| m.order == Some(stream.order));
        if covered {
            continue;
        }
        let creation_time = stream
            .creation_time
            .or(latest)
            .unwrap_or(DateTime::UNIX_EPOCH);
        latest = Some(latest.map_or(creation_time, |t| t.max(creation_time)));

        messages.push(Message {
            id: stream.stream_id.clone(),
            role: MessageRole::Assistant,
            order: Some(stream.order),
            creation_time,
            content: MessageContent::default(),
            text: String::new(),
            reasoning: String::new(),
            status: PersistedStatus::Pending,
            metadata: None,
            local_attachments: Vec::new(),
            is_optimistic: false,
        });
        added = true;
    }

    if added {
        messages.sort_by_key(|m| m.creation_time);
    }
}
