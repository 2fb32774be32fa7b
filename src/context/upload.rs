//! Background upload task and the events it reports back.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::UploadError;
use crate::traits::{ChatBackend, ProgressFn, UploadedFile};

/// Progress report from an upload task, keyed by attachment id
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress {
        attachment_id: String,
        progress: u8,
    },
    Succeeded {
        attachment_id: String,
        file: UploadedFile,
    },
    Failed {
        attachment_id: String,
        error: UploadError,
    },
}

/// Whole percent of `sent` out of `total`. An empty body counts as done.
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

/// Request an upload target, transfer the bytes, report the outcome.
///
/// Exactly one `Succeeded` or `Failed` event is sent last. Send errors are
/// ignored: a closed channel means the context is gone.
pub(crate) async fn run_upload(
    backend: Arc<dyn ChatBackend>,
    attachment_id: String,
    bytes: Bytes,
    content_type: String,
    tx: mpsc::UnboundedSender<UploadEvent>,
) {
    let progress_tx = tx.clone();
    let progress_id = attachment_id.clone();
    let progress: ProgressFn = Arc::new(move |sent, total| {
        let _ = progress_tx.send(UploadEvent::Progress {
            attachment_id: progress_id.clone(),
            progress: percent(sent, total),
        });
    });

    let result = transfer(backend.as_ref(), bytes, &content_type, progress).await;
    let event = match result {
        Ok(file) => UploadEvent::Succeeded {
            attachment_id,
            file,
        },
        Err(error) => UploadEvent::Failed {
            attachment_id,
            error,
        },
    };
    let _ = tx.send(event);
}

async fn transfer(
    backend: &dyn ChatBackend,
    bytes: Bytes,
    content_type: &str,
    progress: ProgressFn,
) -> Result<UploadedFile, UploadError> {
    let target = backend.generate_upload_url().await?;
    let file = backend.upload(&target, bytes, content_type, progress).await?;
    if file.storage_id.is_empty() {
        return Err(UploadError::MissingStorageId);
    }
    Ok(file)
}
