//! Concrete implementations of trait abstractions.
//!
//! - [`HttpChatBackend`] - function-call JSON API over reqwest
//!
//! The [`mock`] submodule provides the test double:
//! - [`mock::MockBackend`] - configurable pages, deltas and upload outcomes

pub mod http_backend;
pub mod mock;

pub use http_backend::HttpChatBackend;
pub use mock::{MockBackend, RecordedCall, UploadBehavior};
