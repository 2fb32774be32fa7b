//! chatline - chat message reconciliation engine
//!
//! Merges a paginated snapshot of persisted messages, locally created
//! optimistic messages and token-level stream deltas into one stable,
//! duplicate-free display list. This library exposes modules for use in
//! integration tests and the replay binary.

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod screenshot;
pub mod stream_deltas;
pub mod sync;
pub mod traits;
