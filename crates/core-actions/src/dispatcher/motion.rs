//! Motion sub-dispatch: cursor movement plus the two Up/Down navigators.
//!
//! Nothing here edits text directly. History moves replace the text wholesale
//! and report a change, but they never count as an edit: browsing state and the
//! suggestion selection survive them.

use super::{DispatchContext, DispatchResult};
use core_state::{EditorState, history};
use core_text::motion;
use tracing::trace;

pub(crate) fn handle_vertical(
    state: &mut EditorState,
    ctx: &DispatchContext<'_>,
    up: bool,
) -> DispatchResult {
    let overlay = ctx.overlay();
    let text = state.text();
    if overlay.is_active(&text) {
        overlay.navigate(state, up);
        return DispatchResult::clean();
    }

    let at_boundary = if up {
        history::can_go_older(state, ctx.history)
    } else {
        history::can_go_newer(state)
    };
    if at_boundary {
        let step = if up {
            history::older(state, ctx.history)
        } else {
            history::newer(state, ctx.history)
        };
        if !step.changed_text() {
            return DispatchResult::clean();
        }
        // A history entry may itself start with the prefix.
        overlay.sync(state);
        let loaded = state.text();
        if loaded == text {
            return DispatchResult::clean();
        }
        return DispatchResult::changed(loaded);
    }

    let before = state.cursor();
    let target = if up {
        motion::line_up(&state.buffer, before)
    } else {
        motion::line_down(&state.buffer, before)
    };
    state.buffer.set_cursor(target);
    trace!(target: "actions.dispatch", op = if up { "line_up" } else { "line_down" }, from = before, to = target, "motion");
    DispatchResult::clean()
}

pub(crate) fn handle_horizontal(state: &mut EditorState, right: bool, word: bool) -> DispatchResult {
    let before = state.cursor();
    match (right, word) {
        (true, true) => {
            let target = motion::word_forward(&state.buffer, before);
            state.buffer.set_cursor(target);
        }
        (false, true) => {
            let target = motion::word_backward(&state.buffer, before);
            state.buffer.set_cursor(target);
        }
        (true, false) => state.buffer.move_by(1),
        (false, false) => state.buffer.move_by(-1),
    }
    trace!(target: "actions.dispatch", op = "horizontal", right, word, from = before, to = state.cursor(), "motion");
    DispatchResult::clean()
}

pub(crate) fn handle_line_bound(state: &mut EditorState, end: bool) -> DispatchResult {
    let at = state.cursor();
    let target = if end {
        state.buffer.line_end(at)
    } else {
        state.buffer.line_start(at)
    };
    state.buffer.set_cursor(target);
    DispatchResult::clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn owned(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn up_down_move_between_lines_without_history() {
        let ctx = DispatchContext::new(&[], &[], '/');
        let mut st = EditorState::with_text("first line\nsecond");
        st.buffer.set_cursor(15);
        handle_vertical(&mut st, &ctx, true);
        assert_eq!(st.cursor(), 4);
        handle_vertical(&mut st, &ctx, false);
        assert_eq!(st.cursor(), 15);
        handle_vertical(&mut st, &ctx, false);
        assert_eq!(st.cursor(), 17);
        st.buffer.set_cursor(3);
        handle_vertical(&mut st, &ctx, true);
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn history_load_reports_change_but_keeps_browsing() {
        let history = owned(&["/help"]);
        let commands = owned(&["help"]);
        let ctx = DispatchContext::new(&history, &commands, '/');
        let mut st = EditorState::new();
        let r = handle_vertical(&mut st, &ctx, true);
        assert!(r.dirty());
        assert_eq!(st.text(), "/help");
        assert!(st.is_browsing());
    }

    #[test]
    fn up_mid_text_is_a_line_move_not_history() {
        let history = owned(&["old"]);
        let ctx = DispatchContext::new(&history, &[], '/');
        let mut st = EditorState::with_text("typing");
        let r = handle_vertical(&mut st, &ctx, true);
        assert!(!r.dirty());
        assert_eq!(st.text(), "typing");
        assert_eq!(st.cursor(), 0);
        let r = handle_vertical(&mut st, &ctx, true);
        assert!(r.dirty(), "cursor now at 0: history takes over");
        assert_eq!(st.text(), "old");
    }

    #[test]
    fn horizontal_char_and_word_moves() {
        let mut st = EditorState::with_text("alpha beta gamma");
        handle_horizontal(&mut st, false, true);
        assert_eq!(st.cursor(), 11);
        handle_horizontal(&mut st, false, true);
        assert_eq!(st.cursor(), 6);
        handle_horizontal(&mut st, false, false);
        assert_eq!(st.cursor(), 5);
        handle_horizontal(&mut st, true, true);
        assert_eq!(st.cursor(), 6);
        handle_horizontal(&mut st, true, true);
        assert_eq!(st.cursor(), 11);
        handle_horizontal(&mut st, true, false);
        assert_eq!(st.cursor(), 12);
    }

    #[test]
    fn home_end_stay_on_current_line() {
        let mut st = EditorState::with_text("ab\ncdef\ng");
        st.buffer.set_cursor(5);
        handle_line_bound(&mut st, false);
        assert_eq!(st.cursor(), 3);
        handle_line_bound(&mut st, true);
        assert_eq!(st.cursor(), 7);
    }
}
