//! Unified error type for chatline.

use thiserror::Error;

use super::backend::BackendError;
use super::category::ErrorCategory;
use super::upload::UploadError;

/// Every failure the façade and its collaborators can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Invalid configuration value.
    #[error("Invalid value for {key}: {message}")]
    Config { key: String, message: String },

    /// A send was attempted while it is not allowed (empty input, pending upload).
    #[error("Cannot send: {reason}")]
    SendBlocked { reason: String },
}

impl ChatError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Backend(err) => err.category(),
            ChatError::Upload(err) => err.category(),
            ChatError::Config { .. } => ErrorCategory::Configuration,
            ChatError::SendBlocked { .. } => ErrorCategory::User,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Backend(err) => err.user_message(),
            ChatError::Upload(err) => err.user_message(),
            ChatError::Config { key, message } => {
                format!("Configuration problem with {}: {}", key, message)
            }
            ChatError::SendBlocked { reason } => reason.clone(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Backend(err) => err.error_code(),
            ChatError::Upload(err) => err.error_code(),
            ChatError::Config { .. } => "E_CONFIG",
            ChatError::SendBlocked { .. } => "E_SEND_BLOCKED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_categories() {
        let timeout: ChatError = BackendError::Timeout {
            operation: "list".to_string(),
        }
        .into();
        assert_eq!(timeout.category(), ErrorCategory::Network);
        assert!(timeout.is_retryable());

        let unauthorized: ChatError = BackendError::Status {
            status: 401,
            message: "no".to_string(),
        }
        .into();
        assert_eq!(unauthorized.category(), ErrorCategory::Configuration);

        let server: ChatError = BackendError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(server.category(), ErrorCategory::Server);
    }

    #[test]
    fn test_upload_categories() {
        let too_large: ChatError = UploadError::TooLarge { size: 2, limit: 1 }.into();
        assert_eq!(too_large.category(), ErrorCategory::User);

        let transport: ChatError = UploadError::Transport(BackendError::Connection {
            url: "x".to_string(),
            message: "y".to_string(),
        })
        .into();
        assert_eq!(transport.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_transparent_display() {
        let err: ChatError = BackendError::Cancelled.into();
        assert_eq!(err.to_string(), "Request cancelled");
    }

    #[test]
    fn test_send_blocked() {
        let err = ChatError::SendBlocked {
            reason: "Wait for uploads to finish".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::User);
        assert_eq!(err.error_code(), "E_SEND_BLOCKED");
        assert!(!err.is_retryable());
    }
}
