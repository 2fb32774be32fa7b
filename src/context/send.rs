//! Background send task and the events it reports back.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ChatError;
use crate::traits::{ChatBackend, SendRequest};

/// Progress report from the send task
#[derive(Debug, Clone, PartialEq)]
pub enum SendEvent {
    /// The context had no thread, so one was created for this message
    ThreadCreated { thread_id: String },
    Sent { thread_id: String, files: usize },
    Failed { error: ChatError },
}

/// What the context needs to finish or roll back the send in flight.
#[derive(Debug)]
pub(crate) struct PendingSend {
    pub optimistic_id: String,
    /// Input as it was before sending, restored on failure
    pub input: String,
    /// Attachments included in the request, cleared on success
    pub attachment_ids: Vec<String>,
    pub task: JoinHandle<()>,
}

/// Create a thread if needed, then send the message.
///
/// Exactly one `Sent` or `Failed` event is sent last. Send errors are
/// ignored: a closed channel means the context is gone.
pub(crate) async fn run_send(
    backend: Arc<dyn ChatBackend>,
    thread_id: Option<String>,
    request: SendRequest,
    tx: mpsc::UnboundedSender<SendEvent>,
) {
    let thread_id = match thread_id {
        Some(id) => id,
        None => match backend.create_thread().await {
            Ok(id) => {
                tracing::info!(thread_id = %id, "Created thread");
                let _ = tx.send(SendEvent::ThreadCreated {
                    thread_id: id.clone(),
                });
                id
            }
            Err(e) => {
                let _ = tx.send(SendEvent::Failed { error: e.into() });
                return;
            }
        },
    };

    let files = request.file_ids.len();
    let event = match backend.send_message(&thread_id, request).await {
        Ok(()) => SendEvent::Sent { thread_id, files },
        Err(e) => SendEvent::Failed { error: e.into() },
    };
    let _ = tx.send(event);
}
