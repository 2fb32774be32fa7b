//! Fixture replay.
//!
//! A fixture is a JSON script:
//!
//! ```json
//! {
//!   "threadId": "t1",
//!   "steps": [
//!     { "type": "list", "messages": [{ "_id": "m1", "role": "user", "text": "Hi", "order": 0 }] },
//!     { "type": "send", "text": "How are you?" },
//!     { "type": "deltas", "streams": [...], "deltas": [...] },
//!     { "type": "attach", "name": "notes.txt", "content": "..." },
//!     { "type": "thread", "threadId": "t2" }
//!   ]
//! }
//! ```
//!
//! Snapshots are stamped with the context's current thread.

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use serde::Deserialize;

use crate::adapters::mock::MockBackend;
use crate::config::ChatConfig;
use crate::context::{ChatContext, Notification};
use crate::models::{
    DeltaSnapshot, DisplayMessage, ListSnapshot, LocalFile, RawMessage, StreamDelta,
    StreamMessageMeta,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplayStep {
    /// New list-query snapshot
    #[serde(rename_all = "camelCase")]
    List {
        #[serde(default)]
        messages: Vec<RawMessage>,
        #[serde(default)]
        streams: Option<Vec<StreamMessageMeta>>,
        #[serde(default)]
        is_done: bool,
    },
    /// New delta-query snapshot
    Deltas {
        #[serde(default)]
        streams: Vec<StreamMessageMeta>,
        #[serde(default)]
        deltas: Vec<StreamDelta>,
    },
    /// Type `text` and send it
    Send { text: String },
    /// Attach a text file and wait for its upload
    Attach { name: String, content: String },
    /// Switch threads
    #[serde(rename_all = "camelCase")]
    Thread { thread_id: Option<String> },
}

impl ReplayStep {
    fn label(&self) -> String {
        match self {
            ReplayStep::List { messages, .. } => format!("list ({} messages)", messages.len()),
            ReplayStep::Deltas { deltas, .. } => format!("deltas ({} chunks)", deltas.len()),
            ReplayStep::Send { text } => format!("send {:?}", text),
            ReplayStep::Attach { name, .. } => format!("attach {}", name),
            ReplayStep::Thread { thread_id } => format!("thread {:?}", thread_id),
        }
    }
}

/// Display list after one step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub label: String,
    pub lines: Vec<String>,
    pub notifications: Vec<Notification>,
}

/// One line per display message, e.g. `assistant [streaming] I'm`.
pub fn render_message(message: &DisplayMessage) -> String {
    let mut line = message.role().as_str().to_string();
    if message.is_optimistic() {
        line.push_str(" [pending]");
    }
    if message.is_streaming {
        line.push_str(" [streaming]");
    }
    line.push(' ');
    line.push_str(&message.display_text);
    if !message.display_reasoning.is_empty() {
        line.push_str(&format!(" (reasoning: {})", message.display_reasoning));
    }
    line
}

/// Run every step against a fresh context backed by [`MockBackend`].
pub async fn run_replay(fixture: Fixture) -> Vec<StepReport> {
    let backend = MockBackend::new();
    let mut chat = ChatContext::new(Arc::new(backend), ChatConfig::default());
    if fixture.thread_id.is_some() {
        chat.set_thread(fixture.thread_id.clone());
    }

    let mut reports = Vec::with_capacity(fixture.steps.len());
    for step in fixture.steps {
        let label = step.label();
        let thread_id = chat.thread_id().map(str::to_string);
        match step {
            ReplayStep::List {
                messages,
                streams,
                is_done,
            } => {
                chat.apply_list_snapshot(ListSnapshot {
                    thread_id,
                    messages,
                    streams,
                    is_done,
                });
            }
            ReplayStep::Deltas { streams, deltas } => {
                chat.apply_delta_snapshot(DeltaSnapshot {
                    thread_id,
                    streams,
                    deltas,
                });
            }
            ReplayStep::Send { text } => {
                chat.set_input_value(text);
                let result = match chat.send() {
                    Ok(()) => chat.settle_send().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Replay send failed");
                }
            }
            ReplayStep::Attach { name, content } => {
                chat.upload_file(LocalFile::new(name, content.into_bytes()));
                chat.settle_uploads().await;
            }
            ReplayStep::Thread { thread_id } => {
                chat.set_thread(thread_id);
            }
        }

        reports.push(StepReport {
            label,
            lines: chat.display_messages().iter().map(render_message).collect(),
            notifications: chat.take_notifications(),
        });
    }
    reports
}

/// Read a fixture file and replay it.
pub async fn run_replay_file(path: &Path) -> color_eyre::Result<Vec<StepReport>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Invalid fixture {}", path.display()))?;
    tracing::debug!(steps = fixture.steps.len(), "Loaded fixture");
    Ok(run_replay(fixture).await)
}
