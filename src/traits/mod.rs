//! Trait abstractions for dependency injection and testability.
//!
//! - [`ChatBackend`] - list/delta queries, upload exchange, send mutation

pub mod backend;

pub use backend::{ChatBackend, MessagePage, ProgressFn, SendRequest, UploadTarget, UploadedFile};
