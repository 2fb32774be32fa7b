//! Open/closed state of the per-message reasoning panel.

use std::collections::HashMap;

use crate::models::{DisplayKey, DisplayMessage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PanelState {
    open: bool,
    /// No further automatic transitions once set
    settled: bool,
}

/// Reasoning panel state keyed by display identity
#[derive(Debug, Default)]
pub struct ReasoningPanels {
    panels: HashMap<DisplayKey, PanelState>,
}

impl ReasoningPanels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the automatic transitions for one display message.
    ///
    /// A panel opens when reasoning shows up before any response text, and
    /// closes once when the text arrives. Messages that already have text when
    /// first seen start closed. Nothing reopens a panel except [`Self::toggle`].
    pub fn observe(&mut self, message: &DisplayMessage) {
        let has_reasoning = !message.display_reasoning.is_empty();
        let has_text = !message.display_text.trim().is_empty();
        let key = message.key();

        match self.panels.get_mut(&key) {
            None if has_reasoning => {
                let open = !has_text;
                self.panels.insert(
                    key,
                    PanelState {
                        open,
                        settled: !open,
                    },
                );
            }
            None => {}
            Some(state) => {
                if !state.settled && has_text {
                    state.open = false;
                    state.settled = true;
                }
            }
        }
    }

    pub fn is_open(&self, key: &DisplayKey) -> bool {
        self.panels.get(key).is_some_and(|s| s.open)
    }

    /// Flip a panel by hand. Returns the new open state.
    pub fn toggle(&mut self, key: &DisplayKey) -> bool {
        let state = self.panels.entry(key.clone()).or_default();
        state.open = !state.open;
        state.settled = true;
        state.open
    }

    pub fn clear(&mut self) {
        self.panels.clear();
    }
}
