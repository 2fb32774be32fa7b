//! User-visible transient notifications raised by the façade.

use serde::Serialize;

use crate::error::{ChatError, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Warning,
    Error,
}

/// A message for the user, shown once and then dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Surface a failure; things the user can fix themselves are warnings.
    pub fn for_error(error: &ChatError) -> Self {
        let level = match error.category() {
            ErrorCategory::User => NotificationLevel::Warning,
            ErrorCategory::Network
            | ErrorCategory::Server
            | ErrorCategory::Client
            | ErrorCategory::Configuration => NotificationLevel::Error,
        };
        Self {
            level,
            message: error.user_message(),
        }
    }
}

/// Pending notifications, oldest first
#[derive(Debug, Default)]
pub struct Notifications {
    queue: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        tracing::debug!(level = ?notification.level, message = %notification.message, "Queued notification");
        self.queue.push(notification);
    }

    /// Drain everything queued so far.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    pub fn peek(&self) -> &[Notification] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
