//! Query snapshots, the two backend-fed inputs of a merge pass.

use serde::{Deserialize, Serialize};

use super::message::RawMessage;
use super::stream::{StreamDelta, StreamMessageMeta, StreamStatus};

/// Latest result of the paginated message list query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    /// Thread the page belongs to; a mismatch with the store marks it stale
    pub thread_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub streams: Option<Vec<StreamMessageMeta>>,
    #[serde(default)]
    pub is_done: bool,
}

impl ListSnapshot {
    pub fn empty(thread_id: Option<String>) -> Self {
        Self {
            thread_id,
            ..Self::default()
        }
    }
}

/// Latest result of the stream delta query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSnapshot {
    pub thread_id: Option<String>,
    /// Streams currently reported for the thread
    #[serde(default)]
    pub streams: Vec<StreamMessageMeta>,
    /// Every delta observed so far for those streams
    #[serde(default)]
    pub deltas: Vec<StreamDelta>,
}

impl DeltaSnapshot {
    pub fn empty(thread_id: Option<String>) -> Self {
        Self {
            thread_id,
            ..Self::default()
        }
    }

    /// True when the snapshot reports at least one stream.
    pub fn has_streams(&self) -> bool {
        !self.streams.is_empty()
    }

    /// True when some reported stream is still producing output.
    pub fn has_live_stream(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.status == StreamStatus::Streaming)
    }
}
