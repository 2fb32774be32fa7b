use chrono::{DateTime, Utc};
use serde::Serialize;

use super::message::{Message, MessageRole};

/// Identity of a display row that survives the optimistic → streaming →
/// persisted transitions of the same logical message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DisplayKey {
    Order(i64),
    Id(String),
}

impl std::fmt::Display for DisplayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayKey::Order(order) => write!(f, "order:{}", order),
            DisplayKey::Id(id) => write!(f, "id:{}", id),
        }
    }
}

/// A message after merge, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMessage {
    pub message: Message,
    pub display_text: String,
    pub display_reasoning: String,
    pub is_streaming: bool,
    /// Reasoning shown comes from live or cached stream data, not the row
    pub has_reasoning_stream: bool,
}

impl DisplayMessage {
    pub fn key(&self) -> DisplayKey {
        match self.message.order {
            Some(order) => DisplayKey::Order(order),
            None => DisplayKey::Id(self.message.id.clone()),
        }
    }

    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn role(&self) -> MessageRole {
        self.message.role
    }

    pub fn order(&self) -> Option<i64> {
        self.message.order
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.message.creation_time
    }

    pub fn is_optimistic(&self) -> bool {
        self.message.is_optimistic
    }

    /// Assistant row that already shows some response text
    pub fn is_filled_assistant(&self) -> bool {
        self.message.role == MessageRole::Assistant && !self.display_text.trim().is_empty()
    }
}
