//! Mock implementations for testing.
//!
//! Lets the coordinator, the upload workflow and the replay binary run
//! without network access.

pub mod backend;

pub use backend::{MockBackend, RecordedCall, UploadBehavior};
