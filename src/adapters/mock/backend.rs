//! Mock chat backend for testing.
//!
//! Serves configured pages and deltas per thread, simulates uploads chunk by
//! chunk and records every call for verification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;
use crate::models::{StreamCursor, StreamDelta};
use crate::traits::{ChatBackend, MessagePage, ProgressFn, SendRequest, UploadTarget, UploadedFile};

/// How simulated uploads end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBehavior {
    Succeed,
    /// Transfer this many chunks, then fail with a connection error
    FailAfterChunks(usize),
    /// Fail before any byte is sent
    FailImmediately,
}

/// A recorded backend call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateThread,
    ListMessages { thread_id: String, page_size: usize },
    ListDeltas { thread_id: String, cursors: Vec<StreamCursor> },
    GenerateUploadUrl,
    Upload { content_type: String, size: u64 },
    SendMessage { thread_id: String, request: SendRequest },
}

#[derive(Debug)]
struct MockState {
    pages: HashMap<String, MessagePage>,
    deltas: HashMap<String, Vec<StreamDelta>>,
    upload: UploadBehavior,
    chunk_bytes: usize,
    chunk_delay: Option<Duration>,
    list_error: Option<BackendError>,
    send_error: Option<BackendError>,
    next_thread: u64,
    next_file: u64,
    calls: Vec<RecordedCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            deltas: HashMap::new(),
            upload: UploadBehavior::Succeed,
            chunk_bytes: 4,
            chunk_delay: None,
            list_error: None,
            send_error: None,
            next_thread: 0,
            next_file: 0,
            calls: Vec::new(),
        }
    }
}

/// Mock chat backend for testing.
///
/// Clones share state, so a test can keep one handle for configuration and
/// verification while the context owns another.
///
/// # Example
///
/// ```ignore
/// use chatline::adapters::mock::{MockBackend, UploadBehavior};
///
/// let backend = MockBackend::new();
/// backend.set_upload_behavior(UploadBehavior::FailAfterChunks(1));
/// // ... drive a ChatContext ...
/// assert_eq!(backend.calls().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: RecordedCall) {
        self.state().calls.push(call);
    }

    /// Set the page returned for a thread.
    pub fn set_page(&self, thread_id: &str, page: MessagePage) {
        self.state().pages.insert(thread_id.to_string(), page);
    }

    /// Replace every delta known for a thread.
    pub fn set_deltas(&self, thread_id: &str, deltas: Vec<StreamDelta>) {
        self.state().deltas.insert(thread_id.to_string(), deltas);
    }

    pub fn push_delta(&self, thread_id: &str, delta: StreamDelta) {
        self.state()
            .deltas
            .entry(thread_id.to_string())
            .or_default()
            .push(delta);
    }

    pub fn set_upload_behavior(&self, behavior: UploadBehavior) {
        self.state().upload = behavior;
    }

    /// Bytes per simulated upload chunk (at least one).
    pub fn set_chunk_bytes(&self, chunk_bytes: usize) {
        self.state().chunk_bytes = chunk_bytes.max(1);
    }

    /// Pause between simulated chunks, to leave room for cancellation.
    pub fn set_chunk_delay(&self, delay: Option<Duration>) {
        self.state().chunk_delay = delay;
    }

    /// Make list queries fail until cleared.
    pub fn set_list_error(&self, error: Option<BackendError>) {
        self.state().list_error = error;
    }

    /// Make send mutations fail until cleared.
    pub fn set_send_error(&self, error: Option<BackendError>) {
        self.state().send_error = error;
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Requests passed to the send mutation so far.
    pub fn sent_messages(&self) -> Vec<SendRequest> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::SendMessage { request, .. } => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn create_thread(&self) -> Result<String, BackendError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::CreateThread);
        state.next_thread += 1;
        Ok(format!("thread-{}", state.next_thread))
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        page_size: usize,
    ) -> Result<MessagePage, BackendError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListMessages {
            thread_id: thread_id.to_string(),
            page_size,
        });
        if let Some(err) = state.list_error.clone() {
            return Err(err);
        }
        let mut page = state.pages.get(thread_id).cloned().unwrap_or_default();
        if page.messages.len() > page_size {
            let skip = page.messages.len() - page_size;
            page.messages.drain(..skip);
            page.is_done = false;
        }
        Ok(page)
    }

    async fn list_deltas(
        &self,
        thread_id: &str,
        cursors: &[StreamCursor],
    ) -> Result<Vec<StreamDelta>, BackendError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ListDeltas {
            thread_id: thread_id.to_string(),
            cursors: cursors.to_vec(),
        });
        let Some(deltas) = state.deltas.get(thread_id) else {
            return Ok(Vec::new());
        };
        Ok(deltas
            .iter()
            .filter(|delta| {
                cursors
                    .iter()
                    .any(|c| c.stream_id == delta.stream_id && delta.end > c.cursor)
            })
            .cloned()
            .collect())
    }

    async fn generate_upload_url(&self) -> Result<UploadTarget, BackendError> {
        self.record(RecordedCall::GenerateUploadUrl);
        Ok(UploadTarget {
            url: "mock://upload".to_string(),
        })
    }

    async fn upload(
        &self,
        _target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
        progress: ProgressFn,
    ) -> Result<UploadedFile, BackendError> {
        let total = bytes.len() as u64;
        let (behavior, chunk_bytes, delay) = {
            let mut state = self.state();
            state.calls.push(RecordedCall::Upload {
                content_type: content_type.to_string(),
                size: total,
            });
            (state.upload.clone(), state.chunk_bytes, state.chunk_delay)
        };

        if behavior == UploadBehavior::FailImmediately {
            return Err(BackendError::Connection {
                url: "mock://upload".to_string(),
                message: "simulated failure".to_string(),
            });
        }

        progress(0, total);
        let mut sent = 0u64;
        for (index, chunk) in bytes.chunks(chunk_bytes).enumerate() {
            if behavior == UploadBehavior::FailAfterChunks(index) {
                return Err(BackendError::Connection {
                    url: "mock://upload".to_string(),
                    message: format!("simulated failure after {} chunks", index),
                });
            }
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            sent += chunk.len() as u64;
            progress(sent, total);
        }

        let id = {
            let mut state = self.state();
            state.next_file += 1;
            state.next_file
        };
        Ok(UploadedFile {
            storage_id: format!("storage-{}", id),
            url: Some(format!("https://files.example/storage-{}", id)),
        })
    }

    async fn send_message(
        &self,
        thread_id: &str,
        request: SendRequest,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::SendMessage {
            thread_id: thread_id.to_string(),
            request,
        });
        match state.send_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
