//! Attachment list with per-item upload state.

use crate::models::{Attachment, AttachmentPreview, AttachmentSource, UploadState};
use crate::traits::UploadedFile;

/// Attachments queued for the next message, in insertion order.
///
/// Every mutation is keyed by attachment id, so events that arrive for an
/// attachment the user already removed are no-ops.
#[derive(Debug, Default)]
pub struct AttachmentList {
    items: Vec<Attachment>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attachment: Attachment) {
        self.items.push(attachment);
    }

    pub fn remove(&mut self, id: &str) -> Option<Attachment> {
        let index = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Attachment> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn as_slice(&self) -> &[Attachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// True if a file with this name and size is already attached.
    pub fn has_file(&self, name: &str, size: u64) -> bool {
        self.items
            .iter()
            .any(|a| a.name() == name && a.size() == Some(size))
    }

    /// True if a screenshot with this content hash is already attached.
    pub fn has_screenshot(&self, hash: &str) -> bool {
        self.items.iter().any(|a| {
            matches!(&a.source, AttachmentSource::Screenshot { hash: h, .. } if h == hash)
        })
    }

    pub fn has_uploading(&self) -> bool {
        self.items.iter().any(Attachment::is_uploading)
    }

    /// Raise an uploading attachment's progress. Never moves it backwards.
    pub fn set_progress(&mut self, id: &str, progress: u8) -> bool {
        let Some(attachment) = self.items.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        match &mut attachment.state {
            UploadState::Uploading { progress: current } if progress > *current => {
                *current = progress.min(100);
                true
            }
            _ => false,
        }
    }

    pub fn mark_success(&mut self, id: &str, file: UploadedFile) -> bool {
        let Some(attachment) = self.items.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        attachment.state = UploadState::Success {
            storage_id: file.storage_id,
            url: file.url,
        };
        true
    }

    /// Remote ids of uploaded attachments, in order.
    pub fn storage_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|a| a.storage_id().map(str::to_string))
            .collect()
    }

    /// Previews of uploaded attachments, for the optimistic message.
    pub fn previews(&self) -> Vec<AttachmentPreview> {
        self.items
            .iter()
            .filter(|a| a.storage_id().is_some())
            .map(Attachment::preview)
            .collect()
    }
}
