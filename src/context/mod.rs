//! Chat context
//!
//! The façade rendering code talks to. It owns the message store, the display
//! coordinator, the attachment list and input text, and runs the upload and
//! send workflows against a [`ChatBackend`].
//!
//! Upload and send tasks report back through unbounded channels; the owner
//! drains them with [`ChatContext::process_upload_events`] and
//! [`ChatContext::process_send_events`] on each tick, the same way query
//! snapshots are pulled with [`ChatContext::sync_from_feeds`].

mod attachments;
mod notifications;
mod send;
mod upload;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::cache::MessageStore;
use crate::config::ChatConfig;
use crate::display::DisplayCoordinator;
use crate::error::{BackendError, ChatError, ChatResult, UploadError};
use crate::models::{
    Attachment, AttachmentSource, DeltaSnapshot, DisplayKey, DisplayMessage, ListSnapshot,
    LocalFile, OptimisticMessage,
};
use crate::screenshot::{data_url, is_image, media_type_for, screenshot_filename, short_hash, Screenshot};
use crate::sync::{PollerHandle, QueryPoller, SnapshotFeeds, SnapshotReceivers};
use crate::traits::{ChatBackend, SendRequest};

pub use attachments::AttachmentList;
pub use notifications::{Notification, NotificationLevel, Notifications};
pub use send::SendEvent;
pub use upload::{percent, UploadEvent};

use send::PendingSend;

/// UI façade over one conversation.
///
/// # Example
///
/// ```ignore
/// use chatline::context::ChatContext;
///
/// let mut chat = ChatContext::new(backend, ChatConfig::default());
/// let _poller = chat.spawn_poller();
/// chat.set_input_value("Hi");
/// chat.send()?;
/// loop {
///     chat.sync_from_feeds();
///     chat.process_upload_events();
///     chat.process_send_events();
///     render(chat.display_messages());
/// }
/// ```
pub struct ChatContext {
    store: MessageStore,
    coordinator: DisplayCoordinator,
    backend: Arc<dyn ChatBackend>,
    config: ChatConfig,
    attachments: AttachmentList,
    input: String,
    notifications: Notifications,
    list: Arc<ListSnapshot>,
    deltas: Arc<DeltaSnapshot>,
    feeds: Option<SnapshotReceivers>,
    upload_tx: mpsc::UnboundedSender<UploadEvent>,
    upload_rx: mpsc::UnboundedReceiver<UploadEvent>,
    /// In-flight upload tasks by attachment id
    uploads: HashMap<String, JoinHandle<()>>,
    send_tx: mpsc::UnboundedSender<SendEvent>,
    send_rx: mpsc::UnboundedReceiver<SendEvent>,
    pending_send: Option<PendingSend>,
    thread_tx: watch::Sender<Option<String>>,
}

impl ChatContext {
    /// Create a context with no thread; the first send creates one.
    pub fn new(backend: Arc<dyn ChatBackend>, config: ChatConfig) -> Self {
        Self::with_store(backend, config, MessageStore::new())
    }

    /// Create a context bound to an existing thread.
    pub fn for_thread(
        backend: Arc<dyn ChatBackend>,
        config: ChatConfig,
        thread_id: impl Into<String>,
    ) -> Self {
        Self::with_store(backend, config, MessageStore::for_thread(thread_id))
    }

    fn with_store(backend: Arc<dyn ChatBackend>, config: ChatConfig, store: MessageStore) -> Self {
        let thread_id = store.thread_id().map(str::to_string);
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        let (send_tx, send_rx) = mpsc::unbounded_channel();
        let (thread_tx, _) = watch::channel(thread_id.clone());

        let mut context = Self {
            store,
            coordinator: DisplayCoordinator::new(),
            backend,
            config,
            attachments: AttachmentList::new(),
            input: String::new(),
            notifications: Notifications::default(),
            list: Arc::new(ListSnapshot::empty(thread_id.clone())),
            deltas: Arc::new(DeltaSnapshot::empty(thread_id)),
            feeds: None,
            upload_tx,
            upload_rx,
            uploads: HashMap::new(),
            send_tx,
            send_rx,
            pending_send: None,
            thread_tx,
        };
        context.recompute();
        context
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    // ---------------------------------------------------------------------
    // Thread and query inputs
    // ---------------------------------------------------------------------

    pub fn thread_id(&self) -> Option<&str> {
        self.store.thread_id()
    }

    /// Switch to another thread (or none). Returns `true` if the store reset.
    pub fn set_thread(&mut self, thread_id: Option<String>) -> bool {
        let reset = self.store.set_thread(thread_id.clone());
        self.thread_tx.send_replace(thread_id);
        self.recompute();
        reset
    }

    /// Follow the current thread id, e.g. to drive a [`QueryPoller`].
    pub fn thread_receiver(&self) -> watch::Receiver<Option<String>> {
        self.thread_tx.subscribe()
    }

    /// Pull snapshots from these receivers on [`Self::sync_from_feeds`].
    pub fn attach_feeds(&mut self, receivers: SnapshotReceivers) {
        self.feeds = Some(receivers);
    }

    /// Start polling the backend for the current thread.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_poller(&mut self) -> PollerHandle {
        let (feeds, receivers) = SnapshotFeeds::new(self.thread_id().map(str::to_string));
        self.attach_feeds(receivers);
        QueryPoller::spawn(
            Arc::clone(&self.backend),
            feeds,
            self.thread_receiver(),
            &self.config,
        )
    }

    /// Take the latest published snapshots, if any, and recompute.
    ///
    /// Returns `true` when the display list was recomputed.
    pub fn sync_from_feeds(&mut self) -> bool {
        if let Some(feeds) = self.feeds.as_mut() {
            if feeds.has_changed() {
                let (list, deltas) = feeds.latest();
                self.list = list;
                self.deltas = deltas;
            }
        }
        self.recompute()
    }

    pub fn apply_list_snapshot(&mut self, snapshot: impl Into<Arc<ListSnapshot>>) -> bool {
        self.list = snapshot.into();
        self.recompute()
    }

    pub fn apply_delta_snapshot(&mut self, snapshot: impl Into<Arc<DeltaSnapshot>>) -> bool {
        self.deltas = snapshot.into();
        self.recompute()
    }

    /// Recompute the display list if any input changed.
    pub fn recompute(&mut self) -> bool {
        self.coordinator
            .update(&mut self.store, &self.list, &self.deltas)
    }

    // ---------------------------------------------------------------------
    // Display list
    // ---------------------------------------------------------------------

    pub fn display_messages(&self) -> &[DisplayMessage] {
        self.coordinator.messages()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinator.messages().is_empty()
    }

    pub fn last_message(&self) -> Option<&DisplayMessage> {
        self.coordinator.messages().last()
    }

    /// Drives the loading indicator between send and first visible response.
    pub fn is_awaiting_stream(&self) -> bool {
        self.store.is_awaiting()
    }

    pub fn is_reasoning_open(&self, key: &DisplayKey) -> bool {
        self.coordinator.is_reasoning_open(key)
    }

    /// Flip a reasoning panel. Auto open/close stops for it afterwards.
    pub fn toggle_reasoning(&mut self, key: &DisplayKey) -> bool {
        self.coordinator.toggle_reasoning(key)
    }

    // ---------------------------------------------------------------------
    // Input and attachments
    // ---------------------------------------------------------------------

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input_value(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.as_slice()
    }

    /// Attach files that need no upload, e.g. already stored remotely.
    pub fn add_attachments(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        for attachment in attachments {
            self.attachments.push(attachment);
        }
    }

    /// Remove an attachment, cancelling its upload if one is running.
    pub fn remove_attachment(&mut self, attachment_id: &str) -> bool {
        if let Some(task) = self.uploads.remove(attachment_id) {
            task.abort();
            tracing::info!(attachment_id = %attachment_id, "Cancelled upload");
        }
        self.attachments.remove(attachment_id).is_some()
    }

    pub fn has_file(&self, name: &str, size: u64) -> bool {
        self.attachments.has_file(name, size)
    }

    pub fn has_uploading_files(&self) -> bool {
        self.attachments.has_uploading()
    }

    /// Non-empty input, no attachment still uploading and no send in flight.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty()
            && !self.attachments.has_uploading()
            && self.pending_send.is_none()
    }

    // ---------------------------------------------------------------------
    // Uploads
    // ---------------------------------------------------------------------

    /// Attach a file and start uploading it in the background.
    ///
    /// Returns the new attachment's id, or `None` if the file was rejected
    /// (a notification explains why). Must be called from within a tokio
    /// runtime.
    pub fn upload_file(&mut self, file: LocalFile) -> Option<String> {
        let media_type = file
            .media_type
            .clone()
            .unwrap_or_else(|| media_type_for(&file.name).to_string());
        let source = AttachmentSource::LocalFile {
            name: file.name.clone(),
            size: file.size(),
            media_type: media_type.clone(),
        };
        self.start_upload(source, file.bytes, media_type)
    }

    /// Encode a capture as PNG and upload it like any other file.
    pub fn upload_screenshot(&mut self, screenshot: Screenshot) -> Option<String> {
        let png = match screenshot.encode_png() {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode screenshot");
                self.notifications.push(Notification::for_error(&ChatError::from(e)));
                return None;
            }
        };
        let hash = short_hash(&png);
        if self.attachments.has_screenshot(&hash) {
            tracing::debug!(hash = %hash, "Skipped repeat screenshot");
            self.notifications
                .push(Notification::warning("This screenshot is already attached."));
            return None;
        }

        let source = AttachmentSource::Screenshot {
            name: screenshot_filename(Utc::now()),
            size: png.len() as u64,
            hash,
        };
        self.start_upload(source, Bytes::from(png), "image/png".to_string())
    }

    fn start_upload(
        &mut self,
        source: AttachmentSource,
        bytes: Bytes,
        media_type: String,
    ) -> Option<String> {
        let size = bytes.len() as u64;
        if size > self.config.max_upload_bytes {
            let error = UploadError::TooLarge {
                size,
                limit: self.config.max_upload_bytes,
            };
            tracing::warn!(size, limit = self.config.max_upload_bytes, "Rejected oversized upload");
            self.notifications.push(Notification::for_error(&ChatError::from(error)));
            return None;
        }

        let preview = is_image(&media_type).then(|| data_url(&media_type, &bytes));
        let attachment = Attachment::uploading(source, preview);
        let attachment_id = attachment.id.clone();
        tracing::info!(
            attachment_id = %attachment_id,
            name = %attachment.name(),
            size,
            "Starting upload"
        );
        self.attachments.push(attachment);

        let task = tokio::spawn(upload::run_upload(
            Arc::clone(&self.backend),
            attachment_id.clone(),
            bytes,
            media_type,
            self.upload_tx.clone(),
        ));
        self.uploads.insert(attachment_id.clone(), task);
        Some(attachment_id)
    }

    /// Apply every upload event received so far. Returns how many there were.
    pub fn process_upload_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.upload_rx.try_recv() {
            self.handle_upload_event(event);
            count += 1;
        }
        count
    }

    /// Wait for every in-flight upload to finish and apply its events.
    pub async fn settle_uploads(&mut self) {
        let tasks: Vec<_> = self.uploads.drain().collect();
        for (attachment_id, task) in tasks {
            if let Err(e) = task.await {
                tracing::warn!(attachment_id = %attachment_id, error = %e, "Upload task ended abnormally");
            }
        }
        self.process_upload_events();
    }

    fn handle_upload_event(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress {
                attachment_id,
                progress,
            } => {
                if self.attachments.set_progress(&attachment_id, progress) {
                    tracing::trace!(attachment_id = %attachment_id, progress, "Upload progress");
                }
            }
            UploadEvent::Succeeded {
                attachment_id,
                file,
            } => {
                self.uploads.remove(&attachment_id);
                let storage_id = file.storage_id.clone();
                if self.attachments.mark_success(&attachment_id, file) {
                    tracing::info!(attachment_id = %attachment_id, storage_id = %storage_id, "Upload finished");
                }
            }
            UploadEvent::Failed {
                attachment_id,
                error,
            } => {
                self.uploads.remove(&attachment_id);
                if self.attachments.remove(&attachment_id).is_some() {
                    let error = ChatError::from(error);
                    tracing::warn!(
                        attachment_id = %attachment_id,
                        code = error.error_code(),
                        category = %error.category(),
                        error = %error,
                        "Upload failed"
                    );
                    self.notifications.push(Notification::for_error(&error));
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Sending
    // ---------------------------------------------------------------------

    /// Send the current input with every uploaded attachment.
    ///
    /// The optimistic message shows up right away and the request runs in a
    /// background task; [`Self::process_send_events`] applies its outcome. On
    /// failure the optimistic message is removed, the input is restored and
    /// one notification is queued. Must be called from within a tokio
    /// runtime.
    pub fn send(&mut self) -> ChatResult<()> {
        self.process_upload_events();
        self.process_send_events();
        let blocked = if self.pending_send.is_some() {
            Some("Wait for the previous message to send.")
        } else if self.input.trim().is_empty() {
            Some("Type a message first.")
        } else if self.attachments.has_uploading() {
            Some("Wait for attachments to finish uploading.")
        } else {
            None
        };
        if let Some(reason) = blocked {
            return Err(ChatError::SendBlocked {
                reason: reason.to_string(),
            });
        }

        let prompt = self.input.trim().to_string();
        let request = SendRequest {
            prompt: prompt.clone(),
            file_ids: self.attachments.storage_ids(),
        };
        let attachment_ids = self
            .attachments
            .as_slice()
            .iter()
            .map(|a| a.id.clone())
            .collect();
        let optimistic = OptimisticMessage::user(prompt, self.attachments.previews(), Utc::now());
        let optimistic_id = optimistic.id.clone();
        self.store.add_optimistic_message(optimistic);
        let input = std::mem::take(&mut self.input);
        self.recompute();

        let task = tokio::spawn(send::run_send(
            Arc::clone(&self.backend),
            self.thread_id().map(str::to_string),
            request,
            self.send_tx.clone(),
        ));
        self.pending_send = Some(PendingSend {
            optimistic_id,
            input,
            attachment_ids,
            task,
        });
        Ok(())
    }

    pub fn is_sending(&self) -> bool {
        self.pending_send.is_some()
    }

    /// Apply every send event received so far.
    ///
    /// Returns the outcome once the send in flight has finished, `None` while
    /// it is still running or when nothing was sent.
    pub fn process_send_events(&mut self) -> Option<ChatResult<()>> {
        let mut outcome = None;
        while let Ok(event) = self.send_rx.try_recv() {
            if let Some(result) = self.handle_send_event(event) {
                outcome = Some(result);
            }
        }
        outcome
    }

    /// Wait for the send in flight, if any, and apply its outcome.
    pub async fn settle_send(&mut self) -> ChatResult<()> {
        let Some(pending) = self.pending_send.as_mut() else {
            return Ok(());
        };
        if let Err(e) = (&mut pending.task).await {
            tracing::warn!(error = %e, "Send task ended abnormally");
            if let Some(pending) = self.pending_send.take() {
                let error = ChatError::from(BackendError::Cancelled);
                return Err(self.fail_send(pending, error));
            }
        }
        self.process_send_events().unwrap_or(Ok(()))
    }

    fn handle_send_event(&mut self, event: SendEvent) -> Option<ChatResult<()>> {
        match event {
            SendEvent::ThreadCreated { thread_id } => {
                if self.thread_id().is_none() {
                    self.set_thread(Some(thread_id));
                }
                None
            }
            SendEvent::Sent { thread_id, files } => {
                tracing::info!(thread_id = %thread_id, files, "Message sent");
                let pending = self.pending_send.take()?;
                for id in &pending.attachment_ids {
                    self.attachments.remove(id);
                }
                self.recompute();
                Some(Ok(()))
            }
            SendEvent::Failed { error } => {
                let pending = self.pending_send.take()?;
                Some(Err(self.fail_send(pending, error)))
            }
        }
    }

    fn fail_send(&mut self, pending: PendingSend, error: ChatError) -> ChatError {
        tracing::warn!(
            thread_id = ?self.thread_id(),
            code = error.error_code(),
            category = %error.category(),
            error = %error,
            "Send failed"
        );
        self.store.remove_optimistic_message(&pending.optimistic_id);
        // Keep anything typed while the request was in flight
        if self.input.trim().is_empty() {
            self.input = pending.input;
        }
        self.notifications.push(Notification::for_error(&error));
        self.recompute();
        error
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.take()
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.peek()
    }
}

impl Drop for ChatContext {
    fn drop(&mut self) {
        for (_, task) in self.uploads.drain() {
            task.abort();
        }
        if let Some(pending) = self.pending_send.take() {
            pending.task.abort();
        }
    }
}
