//! Optimistic buffer operations for MessageStore

use crate::models::OptimisticMessage;

use super::{MessageStore, ThreadPhase};

impl MessageStore {
    /// Buffer a message the user just sent and enter the sending phase.
    pub fn add_optimistic_message(&mut self, message: OptimisticMessage) {
        tracing::debug!(
            thread_id = ?self.thread_id,
            message_id = %message.id,
            "Adding optimistic message"
        );
        self.optimistic.push(message);
        self.revision += 1;
        self.set_phase(ThreadPhase::Sending);
    }

    pub fn clear_optimistic_messages(&mut self) {
        if !self.optimistic.is_empty() {
            self.optimistic.clear();
            self.revision += 1;
        }
    }

    /// Remove one optimistic message, e.g. after its send failed.
    pub fn remove_optimistic_message(&mut self, id: &str) -> Option<OptimisticMessage> {
        let pos = self.optimistic.iter().position(|m| m.id == id)?;
        self.revision += 1;
        let removed = self.optimistic.remove(pos);
        if self.optimistic.is_empty() && self.phase == ThreadPhase::Sending {
            self.set_phase(ThreadPhase::Idle);
        }
        Some(removed)
    }

    pub fn optimistic_messages(&self) -> &[OptimisticMessage] {
        &self.optimistic
    }

    /// Drop buffered messages a list snapshot has confirmed.
    ///
    /// Returns the number removed.
    pub(crate) fn discard_superseded(&mut self, ids: &[String]) -> usize {
        let before = self.optimistic.len();
        self.optimistic.retain(|m| !ids.contains(&m.id));
        let removed = before - self.optimistic.len();
        if removed > 0 {
            tracing::debug!(thread_id = ?self.thread_id, removed, "Optimistic messages confirmed");
            self.revision += 1;
        }
        removed
    }
}
