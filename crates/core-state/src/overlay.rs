//! Command suggestion overlay.
//!
//! The overlay is active whenever the text starts with the command prefix. Its
//! candidates are recomputed from the text on every query: the command names
//! that contain the typed query as a case-insensitive substring, in list order.

use crate::EditorState;
use tracing::trace;

/// Filters and selects among externally owned command names.
#[derive(Debug, Clone, Copy)]
pub struct OverlaySelector<'a> {
    prefix: char,
    commands: &'a [String],
}

impl<'a> OverlaySelector<'a> {
    pub fn new(prefix: char, commands: &'a [String]) -> Self {
        Self { prefix, commands }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn is_active(&self, text: &str) -> bool {
        text.starts_with(self.prefix)
    }

    /// Matching command names, or `None` when the overlay is inactive.
    pub fn filtered(&self, text: &str) -> Option<Vec<&'a str>> {
        let query = text.strip_prefix(self.prefix)?.to_lowercase();
        let matches: Vec<&'a str> = self
            .commands
            .iter()
            .filter(|name| name.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect();
        trace!(target: "state.overlay", query_len = query.len(), matches = matches.len(), "filter");
        Some(matches)
    }

    /// Clamp the selection into the current candidate list after a text change.
    pub fn sync(&self, state: &mut EditorState) {
        let count = self.filtered(&state.text()).map_or(0, |m| m.len());
        if count > 0 && state.selected_suggestion() >= count {
            state.set_selected_suggestion(count - 1);
        }
    }

    /// Move the selection one step, clamped at both ends. Up is towards index 0.
    pub fn navigate(&self, state: &mut EditorState, up: bool) {
        let count = self.filtered(&state.text()).map_or(0, |m| m.len());
        if count == 0 {
            return;
        }
        let current = state.selected_suggestion().min(count - 1);
        let next = if up {
            current.saturating_sub(1)
        } else {
            (current + 1).min(count - 1)
        };
        state.set_selected_suggestion(next);
        trace!(target: "state.overlay", selected = next, count, "navigate");
    }

    /// Text to submit for an overlay commit.
    ///
    /// With candidates: prefix plus the selected name, or the first name when
    /// the selection is stale. Without candidates: the raw text unchanged.
    pub fn commit(&self, state: &EditorState) -> String {
        let text = state.text();
        let Some(matches) = self.filtered(&text) else {
            return text;
        };
        let Some(&first) = matches.first() else {
            return text;
        };
        let chosen = matches
            .get(state.selected_suggestion())
            .copied()
            .unwrap_or(first);
        let mut out = String::with_capacity(chosen.len() + self.prefix.len_utf8());
        out.push(self.prefix);
        out.push_str(chosen);
        out
    }
}
