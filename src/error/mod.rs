//! Error handling for chatline.
//!
//! The merge path never fails; malformed input degrades instead. Errors only
//! come from the edges:
//!
//! - **`BackendError`**: queries, mutations and uploads against the backend
//! - **`UploadError`**: the attachment upload workflow
//! - **`ChatError`**: everything the façade reports, with an `ErrorCategory`
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout | Yes |
//! | Server | 5xx | Yes |
//! | Client | Invalid response, rejected function call | No |
//! | User | User action required | No |
//! | Configuration | Bad settings or credentials | No |

mod backend;
mod category;
mod chat_error;
mod upload;

pub use backend::{classify_reqwest_error, BackendError};
pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use upload::UploadError;

/// Type alias for Results using ChatError.
pub type ChatResult<T> = Result<T, ChatError>;
