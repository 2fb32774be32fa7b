use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentPreview;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

impl MessageRole {
    /// Lowercase name as used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One typed part of a structured message body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        #[serde(default, deserialize_with = "super::deserialize_nullable_string")]
        text: String,
    },
    File {
        #[serde(default, alias = "fileId")]
        file_id: Option<String>,
        #[serde(default, alias = "data")]
        url: Option<String>,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default, alias = "mediaType", alias = "mimeType")]
        media_type: Option<String>,
    },
    Image {
        #[serde(default, alias = "image")]
        url: Option<String>,
        #[serde(default, alias = "mediaType", alias = "mimeType")]
        media_type: Option<String>,
    },
    Reasoning {
        #[serde(default, deserialize_with = "super::deserialize_nullable_string")]
        text: String,
    },
    /// Part types we do not render (tool calls, sources, ...)
    #[serde(other)]
    Unsupported,
}

impl ContentPart {
    /// True for parts that reference an uploaded file or image.
    pub fn is_attachment(&self) -> bool {
        matches!(self, ContentPart::File { .. } | ContentPart::Image { .. })
    }
}

/// Message body - either a flat string or an ordered list of parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Borrow the part list, or an empty slice for flat content.
    pub fn parts(&self) -> &[ContentPart] {
        match self {
            MessageContent::Parts(parts) => parts,
            MessageContent::Text(_) => &[],
        }
    }
}

/// Persistence status reported by the list query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistedStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Provider tag plus whatever provider-specific fields came with the message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub fields: serde_json::Value,
}

/// Nested `{ role, content }` object some rows carry instead of top-level fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NestedMessage {
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

/// A message row exactly as the list query hands it over.
///
/// Every field is optional or defaulted: rows from older schema versions and
/// half-written rows must still deserialize so one bad row cannot blank the
/// whole page. [`crate::normalize::normalize`] turns this into a [`Message`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default, alias = "_id", deserialize_with = "super::deserialize_id")]
    pub id: String,
    /// Milliseconds since the Unix epoch
    #[serde(
        default,
        rename = "_creationTime",
        alias = "creationTime",
        deserialize_with = "super::deserialize_timestamp"
    )]
    pub creation_time: f64,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub role: Option<MessageRole>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub message: Option<NestedMessage>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub status: Option<PersistedStatus>,
    #[serde(default, deserialize_with = "super::deserialize_lenient")]
    pub provider: Option<String>,
    #[serde(default)]
    pub provider_metadata: Option<serde_json::Value>,
}

/// Canonical message shape shared by persisted and optimistic messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    /// Backend-assigned position in the thread; `None` for optimistic messages
    pub order: Option<i64>,
    pub creation_time: DateTime<Utc>,
    pub content: MessageContent,
    /// Plain user-visible text extracted from `content`
    pub text: String,
    /// Persisted reasoning, empty when the row carries none
    pub reasoning: String,
    pub status: PersistedStatus,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    /// Previews of files attached locally before the send was confirmed
    #[serde(default)]
    pub local_attachments: Vec<AttachmentPreview>,
    #[serde(default)]
    pub is_optimistic: bool,
}

/// A message created client-side when the user hits send.
///
/// Never mutated after creation; the store only ever drops it once a
/// persisted message with the same role and text shows up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimisticMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub creation_time: DateTime<Utc>,
    /// Provisional order, if the caller has a guess
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub local_attachments: Vec<AttachmentPreview>,
}

impl OptimisticMessage {
    /// Create an optimistic user message with a fresh local id.
    pub fn user(
        text: impl Into<String>,
        local_attachments: Vec<AttachmentPreview>,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("optimistic-{}", uuid::Uuid::new_v4()),
            role: MessageRole::User,
            text: text.into(),
            creation_time,
            order: None,
            local_attachments,
        }
    }

    /// Project into the canonical shape so it can sit in the merged list.
    pub fn to_message(&self) -> Message {
        Message {
            id: self.id.clone(),
            role: self.role,
            order: self.order,
            creation_time: self.creation_time,
            content: MessageContent::Text(self.text.clone()),
            text: self.text.clone(),
            reasoning: String::new(),
            status: PersistedStatus::Pending,
            metadata: None,
            local_attachments: self.local_attachments.clone(),
            is_optimistic: true,
        }
    }
}
