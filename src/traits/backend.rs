//! Chat backend trait abstraction.
//!
//! The backend is a passive provider of list queries, delta queries, an
//! upload exchange and a send mutation. Everything the coordinator needs goes
//! through this trait so tests and the replay binary can run without network
//! access.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::{RawMessage, StreamCursor, StreamDelta, StreamMessageMeta};

/// Progress callback for uploads: `(bytes_sent, bytes_total)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// One page of the message list query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Rows that fail to parse are dropped; the rest of the page survives
    #[serde(
        default,
        alias = "page",
        deserialize_with = "crate::models::deserialize_lenient_vec"
    )]
    pub messages: Vec<RawMessage>,
    #[serde(default, deserialize_with = "crate::models::deserialize_lenient_opt_vec")]
    pub streams: Option<Vec<StreamMessageMeta>>,
    #[serde(default)]
    pub is_done: bool,
}

/// Short-lived destination for one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub url: String,
}

/// Durable handle of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub storage_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Arguments of the send mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub prompt: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// Operations the chat engine consumes from its backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create a thread for a conversation whose first message is being sent.
    async fn create_thread(&self) -> Result<String, BackendError>;

    /// Fetch the latest page of persisted messages.
    ///
    /// Must succeed with an empty page for a thread with no messages yet.
    async fn list_messages(
        &self,
        thread_id: &str,
        page_size: usize,
    ) -> Result<MessagePage, BackendError>;

    /// Fetch deltas produced after each cursor.
    ///
    /// An empty cursor list yields an empty result.
    async fn list_deltas(
        &self,
        thread_id: &str,
        cursors: &[StreamCursor],
    ) -> Result<Vec<StreamDelta>, BackendError>;

    /// Request a short-lived upload target.
    async fn generate_upload_url(&self) -> Result<UploadTarget, BackendError>;

    /// Transfer bytes to an upload target, reporting progress as they go.
    async fn upload(
        &self,
        target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
        progress: ProgressFn,
    ) -> Result<UploadedFile, BackendError>;

    /// Send a user message. The persisted row shows up in a later list query.
    async fn send_message(&self, thread_id: &str, request: SendRequest)
        -> Result<(), BackendError>;
}
