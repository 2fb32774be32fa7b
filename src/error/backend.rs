//! Errors raised while talking to the chat backend.

use thiserror::Error;

use super::category::ErrorCategory;

/// Failure of a query, mutation or upload request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection to the server failed.
    #[error("Connection failed to '{url}': {message}")]
    Connection { url: String, message: String },

    /// Request timed out.
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// HTTP status error (non-2xx response).
    #[error("HTTP {status} error: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Request was abandoned before it finished.
    #[error("Request cancelled")]
    Cancelled,

    /// The backend function ran and reported an error.
    #[error("{path} failed: {message}")]
    Rejected { path: String, message: String },

    #[error("Backend error: {message}")]
    Other { message: String },
}

impl BackendError {
    /// Classify for retry and notification decisions.
    ///
    /// 401/403 mean the configured token is wrong; 408/429 are treated like
    /// network hiccups.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BackendError::Connection { .. } | BackendError::Timeout { .. } => ErrorCategory::Network,
            BackendError::Status { status, .. } => match *status {
                401 | 403 => ErrorCategory::Configuration,
                408 | 429 => ErrorCategory::Network,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            BackendError::Cancelled => ErrorCategory::User,
            BackendError::InvalidResponse { .. }
            | BackendError::Rejected { .. }
            | BackendError::Other { .. } => ErrorCategory::Client,
        }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Connection { .. } => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            BackendError::Timeout { .. } => {
                "The server took too long to respond. Please try again.".to_string()
            }
            BackendError::Status { status, .. } => match *status {
                401 => "Authentication required. Please sign in again.".to_string(),
                403 => "Access denied. You don't have permission for this action.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                413 => "The file is too large for the server.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!(
                    "The server returned an error (HTTP {}). Please try again.",
                    status
                ),
            },
            BackendError::InvalidResponse { .. } => {
                "Received an invalid response from the server. Please try again.".to_string()
            }
            BackendError::Cancelled => "The request was cancelled.".to_string(),
            BackendError::Rejected { message, .. } => message.clone(),
            BackendError::Other { message } => format!("Something went wrong: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            BackendError::Connection { .. } => "E_BACKEND_CONN",
            BackendError::Timeout { .. } => "E_BACKEND_TIMEOUT",
            BackendError::Status { .. } => "E_BACKEND_HTTP",
            BackendError::InvalidResponse { .. } => "E_BACKEND_INVALID",
            BackendError::Cancelled => "E_BACKEND_CANCEL",
            BackendError::Rejected { .. } => "E_BACKEND_REJECTED",
            BackendError::Other { .. } => "E_BACKEND_OTHER",
        }
    }
}

/// Classify a reqwest error into a BackendError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> BackendError {
    if err.is_connect() {
        BackendError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        BackendError::Timeout {
            operation: format!("Request to {}", url),
        }
    } else if let Some(status) = err.status() {
        BackendError::Status {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_decode() {
        BackendError::InvalidResponse {
            message: format!("Failed to decode response: {}", err),
        }
    } else {
        BackendError::Other {
            message: err.to_string(),
        }
    }
}
