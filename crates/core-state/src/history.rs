//! History navigation over an externally owned, oldest-first entry list.
//!
//! The navigator is stateless; all cursor state lives in `EditorState`. The
//! controller decides when Up/Down are history moves with `can_go_older` and
//! `can_go_newer`, then calls `older`/`newer`. Entry text is never logged.

use crate::EditorState;
use tracing::debug;

/// Result of one history move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// An entry was loaded into the buffer.
    Loaded,
    /// Browsing ended and the pre-browse draft is back.
    Restored,
    /// Already at the boundary; nothing changed.
    Unchanged,
}

impl HistoryStep {
    pub fn changed_text(self) -> bool {
        !matches!(self, HistoryStep::Unchanged)
    }
}

/// Up is a history move when history is non-empty and either the cursor sits
/// at offset 0, or an entry is already loaded and the cursor is on its first line.
pub fn can_go_older(state: &EditorState, history: &[String]) -> bool {
    if history.is_empty() {
        return false;
    }
    if state.cursor() == 0 {
        return true;
    }
    state.is_browsing() && state.buffer.line_column_of(state.cursor()).0 == 0
}

/// Down is a history move only while browsing with the cursor at the end of the text.
pub fn can_go_newer(state: &EditorState) -> bool {
    state.is_browsing() && state.cursor() == state.buffer.len()
}

/// Load the next older entry. The first call captures the live text as the draft.
pub fn older(state: &mut EditorState, history: &[String]) -> HistoryStep {
    let len = history.len();
    if len == 0 {
        return HistoryStep::Unchanged;
    }
    let next = match state.history_index() {
        None => {
            state.capture_draft();
            0
        }
        // History may have shrunk since the index was set.
        Some(i) if i >= len => len - 1,
        Some(i) => (i + 1).min(len - 1),
    };
    if state.history_index() == Some(next) {
        debug!(target: "state.history", index = next, len, "older_at_oldest");
        return HistoryStep::Unchanged;
    }
    load(state, history, next);
    HistoryStep::Loaded
}

/// Load the next newer entry, or restore the draft when stepping past the newest.
pub fn newer(state: &mut EditorState, history: &[String]) -> HistoryStep {
    let Some(current) = state.history_index() else {
        return HistoryStep::Unchanged;
    };
    let len = history.len();
    if current == 0 || len == 0 {
        let draft = state.take_draft();
        state.stop_browsing();
        state.buffer.set_text(&draft);
        debug!(target: "state.history", draft_len = draft.len(), "draft_restored");
        return HistoryStep::Restored;
    }
    let next = current.min(len) - 1;
    load(state, history, next);
    HistoryStep::Loaded
}

fn load(state: &mut EditorState, history: &[String], index: usize) {
    let entry = &history[history.len() - 1 - index];
    state.set_history_index(index);
    state.buffer.set_text(entry);
    debug!(target: "state.history", index, entry_len = entry.len(), "entry_loaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hist(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn walk_back_and_forth_restores_draft() {
        let history = hist(&["hello", "world"]);
        let mut st = EditorState::new();

        assert!(can_go_older(&st, &history));
        assert_eq!(older(&mut st, &history), HistoryStep::Loaded);
        assert_eq!(st.text(), "world");
        assert_eq!(st.cursor(), 5);
        assert_eq!(st.history_index(), Some(0));

        assert!(can_go_older(&st, &history), "first line of a loaded entry keeps walking");
        assert_eq!(older(&mut st, &history), HistoryStep::Loaded);
        assert_eq!(st.text(), "hello");
        assert_eq!(st.history_index(), Some(1));

        assert_eq!(older(&mut st, &history), HistoryStep::Unchanged);
        assert_eq!(st.text(), "hello");

        assert!(can_go_newer(&st));
        assert_eq!(newer(&mut st, &history), HistoryStep::Loaded);
        assert_eq!(st.text(), "world");

        assert_eq!(newer(&mut st, &history), HistoryStep::Restored);
        assert_eq!(st.text(), "");
        assert_eq!(st.history_index(), None);

        assert!(!can_go_newer(&st));
        assert_eq!(newer(&mut st, &history), HistoryStep::Unchanged);
        assert_eq!(st.text(), "");
    }

    #[test]
    fn draft_is_captured_from_live_text() {
        let history = hist(&["old"]);
        let mut st = EditorState::with_text("half typed");
        st.buffer.set_cursor(0);
        assert_eq!(older(&mut st, &history), HistoryStep::Loaded);
        assert_eq!(st.draft(), "half typed");
        assert_eq!(newer(&mut st, &history), HistoryStep::Restored);
        assert_eq!(st.text(), "half typed");
        assert_eq!(st.cursor(), st.buffer.len());
    }

    #[test]
    fn live_text_needs_cursor_at_start() {
        let history = hist(&["a"]);
        let st = EditorState::with_text("typing");
        assert!(!can_go_older(&st, &history));
        assert!(!can_go_older(&EditorState::new(), &[]));
    }

    #[test]
    fn multi_line_entry_only_continues_from_first_line() {
        let history = hist(&["older", "line one\nline two"]);
        let mut st = EditorState::new();
        older(&mut st, &history);
        assert_eq!(st.text(), "line one\nline two");
        assert!(!can_go_older(&st, &history), "cursor is on the last line");
        st.buffer.set_cursor(3);
        assert!(can_go_older(&st, &history));
        assert!(!can_go_newer(&st), "cursor is not at the end");
    }

    #[test]
    fn shrunk_history_clamps_index() {
        let long = hist(&["a", "b", "c"]);
        let mut st = EditorState::new();
        older(&mut st, &long);
        older(&mut st, &long);
        older(&mut st, &long);
        assert_eq!(st.history_index(), Some(2));

        let short = hist(&["z"]);
        assert_eq!(older(&mut st, &short), HistoryStep::Loaded);
        assert_eq!(st.history_index(), Some(0));
        assert_eq!(st.text(), "z");
    }
}
