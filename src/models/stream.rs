//! Stream metadata, raw deltas and the per-order state derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an in-flight AI response stream
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Streaming,
    Finished,
    Aborted,
}

/// A stream the backend currently knows about for a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessageMeta {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub stream_id: String,
    /// Order of the message this stream will eventually persist as
    pub order: i64,
    pub status: StreamStatus,
    /// Milliseconds since the Unix epoch
    #[serde(default, rename = "_creationTime", alias = "creationTime")]
    pub creation_time: Option<f64>,
}

/// Position up to which the client has already consumed a stream's deltas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamCursor {
    pub stream_id: String,
    pub cursor: u64,
}

/// A fragment of streamed output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DeltaPart {
    TextDelta {
        #[serde(alias = "textDelta", alias = "delta")]
        text: String,
    },
    ReasoningDelta {
        #[serde(alias = "textDelta", alias = "delta")]
        text: String,
    },
    #[serde(other)]
    Other,
}

/// One chunk of stream output covering the cursor range `[start, end)`.
///
/// Chunks for the same stream may arrive out of network order; `start` is the
/// sequence they must be concatenated in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamDelta {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub stream_id: String,
    pub start: u64,
    pub end: u64,
    #[serde(default, deserialize_with = "super::deserialize_lenient_vec")]
    pub parts: Vec<DeltaPart>,
}

/// Ephemeral text and reasoning accumulated for one stream, keyed by order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamState {
    pub stream_id: String,
    pub order: i64,
    pub status: StreamStatus,
    pub text: String,
    pub reasoning: String,
    /// End of the last delta folded into `text`/`reasoning`
    pub cursor: u64,
    pub creation_time: Option<DateTime<Utc>>,
}

impl StreamState {
    /// Fresh state for a stream that has not produced anything yet.
    pub fn empty(meta: &StreamMessageMeta) -> Self {
        Self {
            stream_id: meta.stream_id.clone(),
            order: meta.order,
            status: meta.status,
            text: String::new(),
            reasoning: String::new(),
            cursor: 0,
            creation_time: meta
                .creation_time
                .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.status == StreamStatus::Streaming
    }
}
