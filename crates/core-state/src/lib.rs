//! Editor state: the text buffer plus the history and suggestion cursors.
//!
//! `EditorState` is a plain value owned by one controller. History entries and
//! command names are never stored here; they are snapshots handed in on each
//! call to the navigator and selector.
//!
//! Browsing model:
//! - `history_index == None` means the user is editing live text.
//! - `Some(i)` means entry `history[len - 1 - i]` is loaded (0 is the most
//!   recent). The text that was live when browsing started is kept in `draft`.
//! - Any text mutation ends browsing and forgets the draft: the edited text is
//!   the new live text.

use core_text::TextBuffer;

pub mod history;
pub mod overlay;

pub use history::HistoryStep;
pub use overlay::OverlaySelector;

/// Character that opens the command overlay unless configured otherwise.
pub const DEFAULT_COMMAND_PREFIX: char = '/';

#[derive(Clone, Debug, Default)]
pub struct EditorState {
    pub buffer: TextBuffer,
    draft: String,
    history_index: Option<usize>,
    selected_suggestion: usize,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live text with the cursor at its end.
    pub fn with_text(text: &str) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.history_index
    }

    pub fn is_browsing(&self) -> bool {
        self.history_index.is_some()
    }

    /// Text captured when history browsing started. Empty when not browsing.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn selected_suggestion(&self) -> usize {
        self.selected_suggestion
    }

    /// Bookkeeping after any text mutation: selection back to the top, browsing over.
    pub fn note_edit(&mut self) {
        self.selected_suggestion = 0;
        self.stop_browsing();
    }

    /// Clear text, browsing and selection. Used after a submit is consumed.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.note_edit();
    }

    pub(crate) fn stop_browsing(&mut self) {
        self.history_index = None;
        self.draft.clear();
    }

    pub(crate) fn set_history_index(&mut self, index: usize) {
        self.history_index = Some(index);
    }

    pub(crate) fn capture_draft(&mut self) {
        self.draft = self.buffer.text();
    }

    pub(crate) fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    pub(crate) fn set_selected_suggestion(&mut self, index: usize) {
        self.selected_suggestion = index;
    }
}
