//! Attachments queued for the next outgoing message.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Where an attachment came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentSource {
    /// A file picked, pasted or dropped by the user
    LocalFile {
        name: String,
        size: u64,
        media_type: String,
    },
    /// A screenshot captured in-app, always PNG
    Screenshot {
        name: String,
        size: u64,
        /// Short hash of the encoded PNG, used to spot repeat captures
        #[serde(default)]
        hash: String,
    },
    /// A file that already lives in backend storage
    Remote {
        name: String,
        #[serde(default)]
        size: Option<u64>,
        #[serde(default)]
        media_type: Option<String>,
    },
}

/// Upload progress of a single attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    /// Transfer in flight, `progress` is 0-100
    Uploading { progress: u8 },
    Success { storage_id: String, url: Option<String> },
    /// Only seen on attachment lists built by the caller. Failed uploads are
    /// removed from the context instead of parked here.
    Error { message: String },
}

/// A file or image pending or attached to the next message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    /// Locally generated id, stable for the attachment's lifetime
    pub id: String,
    pub source: AttachmentSource,
    /// `data:` URL preview for images
    pub preview_url: Option<String>,
    pub state: UploadState,
}

impl Attachment {
    /// New attachment in `uploading` state at 0%.
    pub fn uploading(source: AttachmentSource, preview_url: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            preview_url,
            state: UploadState::Uploading { progress: 0 },
        }
    }

    /// Attachment for a file that is already stored remotely.
    pub fn remote(
        name: impl Into<String>,
        storage_id: impl Into<String>,
        url: Option<String>,
        media_type: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: AttachmentSource::Remote {
                name: name.into(),
                size: None,
                media_type,
            },
            preview_url: url.clone(),
            state: UploadState::Success {
                storage_id: storage_id.into(),
                url,
            },
        }
    }

    pub fn name(&self) -> &str {
        match &self.source {
            AttachmentSource::LocalFile { name, .. }
            | AttachmentSource::Screenshot { name, .. }
            | AttachmentSource::Remote { name, .. } => name,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match &self.source {
            AttachmentSource::LocalFile { size, .. } | AttachmentSource::Screenshot { size, .. } => {
                Some(*size)
            }
            AttachmentSource::Remote { size, .. } => *size,
        }
    }

    pub fn media_type(&self) -> Option<&str> {
        match &self.source {
            AttachmentSource::LocalFile { media_type, .. } => Some(media_type),
            AttachmentSource::Screenshot { .. } => Some("image/png"),
            AttachmentSource::Remote { media_type, .. } => media_type.as_deref(),
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, UploadState::Uploading { .. })
    }

    /// Remote storage id, once the upload has succeeded.
    pub fn storage_id(&self) -> Option<&str> {
        match &self.state {
            UploadState::Success { storage_id, .. } => Some(storage_id),
            _ => None,
        }
    }

    /// Current progress, 100 once uploaded.
    pub fn progress(&self) -> u8 {
        match self.state {
            UploadState::Uploading { progress } => progress,
            UploadState::Success { .. } => 100,
            UploadState::Error { .. } => 0,
        }
    }

    /// Snapshot carried by the optimistic message that references this file.
    pub fn preview(&self) -> AttachmentPreview {
        AttachmentPreview {
            filename: self.name().to_string(),
            media_type: self.media_type().map(str::to_string),
            preview_url: self.preview_url.clone(),
            storage_id: self.storage_id().map(str::to_string),
        }
    }
}

/// What an optimistic message remembers about its attachments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentPreview {
    pub filename: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub storage_id: Option<String>,
}

/// Raw file handed to the upload workflow
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Bytes,
    /// Guessed from the file name when absent
    pub media_type: Option<String>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
