//! Text mutation: insert, char/word deletion, kill to line end, clear.
//!
//! Every path that changes the text ends in `finish_edit`, which resets the
//! suggestion selection, stops history browsing and reports the new text. Paths
//! that would change nothing return `DispatchResult::clean()` without touching
//! browsing state.

use super::DispatchResult;
use core_state::EditorState;
use core_text::motion;
use tracing::trace;

fn finish_edit(state: &mut EditorState, op: &'static str) -> DispatchResult {
    state.note_edit();
    trace!(target: "actions.dispatch", op, len = state.buffer.len(), cursor = state.cursor(), "edit");
    DispatchResult::changed(state.text())
}

pub(crate) fn insert_text(state: &mut EditorState, s: &str) -> DispatchResult {
    if s.is_empty() {
        return DispatchResult::clean();
    }
    let at = state.cursor();
    state.buffer.insert(at, s);
    finish_edit(state, "insert")
}

pub(crate) fn delete_backward(state: &mut EditorState, word: bool) -> DispatchResult {
    let end = state.cursor();
    let start = if word {
        motion::word_backward(&state.buffer, end)
    } else {
        end.saturating_sub(1)
    };
    if start == end {
        return DispatchResult::clean();
    }
    state.buffer.delete_range(start, end);
    finish_edit(state, if word { "delete_word_backward" } else { "backspace" })
}

pub(crate) fn delete_forward(state: &mut EditorState, word: bool) -> DispatchResult {
    let start = state.cursor();
    let end = if word {
        motion::word_delete_end(&state.buffer, start)
    } else {
        state.buffer.clamp(start + 1)
    };
    if start == end {
        return DispatchResult::clean();
    }
    state.buffer.delete_range(start, end);
    finish_edit(state, if word { "delete_word_forward" } else { "delete_forward" })
}

pub(crate) fn kill_to_line_end(state: &mut EditorState) -> DispatchResult {
    let at = state.cursor();
    if !state.buffer.kill_to_line_end(at) {
        return DispatchResult::clean();
    }
    finish_edit(state, "kill_to_line_end")
}

pub(crate) fn clear(state: &mut EditorState) -> DispatchResult {
    if state.buffer.is_empty() {
        return DispatchResult::clean();
    }
    state.buffer.clear();
    finish_edit(state, "clear")
}
