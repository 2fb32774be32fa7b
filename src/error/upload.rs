//! Upload workflow errors.

use thiserror::Error;

use super::backend::BackendError;
use super::category::ErrorCategory;

/// Reasons an attachment failed to reach backend storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    /// File exceeds the configured upload limit; rejected before any request.
    #[error("File is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Image could not be encoded for upload.
    #[error("Failed to encode image: {message}")]
    EncodeFailed { message: String },

    /// Upload URL request or byte transfer failed.
    #[error("Upload transfer failed: {0}")]
    Transport(#[from] BackendError),

    /// The attachment was removed while uploading.
    #[error("Upload cancelled")]
    Cancelled,

    /// Transfer finished but the response carried no storage id.
    #[error("Upload response did not include a storage id")]
    MissingStorageId,
}

impl UploadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UploadError::Transport(err) => err.category(),
            UploadError::EncodeFailed { .. } | UploadError::MissingStorageId => {
                ErrorCategory::Client
            }
            UploadError::TooLarge { .. } | UploadError::Cancelled => ErrorCategory::User,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::TooLarge { limit, .. } => format!(
                "File is too large. The maximum upload size is {}.",
                human_size(*limit)
            ),
            UploadError::EncodeFailed { .. } => {
                "The image could not be prepared for upload.".to_string()
            }
            UploadError::Transport(err) => format!("Upload failed. {}", err.user_message()),
            UploadError::Cancelled => "The upload was cancelled.".to_string(),
            UploadError::MissingStorageId => {
                "Upload failed. The server did not confirm the file.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::TooLarge { .. } => "E_UPLOAD_SIZE",
            UploadError::EncodeFailed { .. } => "E_UPLOAD_ENCODE",
            UploadError::Transport(_) => "E_UPLOAD_TRANSPORT",
            UploadError::Cancelled => "E_UPLOAD_CANCEL",
            UploadError::MissingStorageId => "E_UPLOAD_NO_ID",
        }
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}
