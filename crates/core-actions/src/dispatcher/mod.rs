//! Dispatcher applying a `KeyAction` to `EditorState`.
//!
//! Precedence, first match wins:
//! 1. `Return { shift: true }` inserts a newline.
//! 2. `Return` with the overlay active commits the selected suggestion.
//! 3. `Return` submits the raw text.
//! 4. Up/Down with the overlay active move the suggestion selection.
//! 5. Up/Down at a history boundary walk the history.
//! 6. Up/Down otherwise move between lines.
//! 7. Left/Right move by char, or by word with ctrl.
//! 8. Home/End go to the line start/end.
//! 9. Delete forward/backward by char, or by word with ctrl.
//! 10. Kill to line end.
//! 11. Char inserts its payload at the cursor.
//! 12. Cancel clears the text.
//! 13. Interrupt is reported to the caller untouched.
//!
//! Sub-modules:
//! * `motion` - cursor movement, history and overlay navigation (4-8)
//! * `edit`   - text mutation (1, 9-12)
//! * `submit` - Return handling and interrupt (2, 3, 13)

use crate::ActionObserver;
use core_events::{EditorEffect, EffectList, KeyAction};
use core_state::{EditorState, OverlaySelector};

mod edit;
mod motion;
mod submit;

/// Read-only collaborators for one dispatch: history (oldest first), command
/// names and the overlay prefix.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub history: &'a [String],
    pub commands: &'a [String],
    pub prefix: char,
}

impl<'a> DispatchContext<'a> {
    pub fn new(history: &'a [String], commands: &'a [String], prefix: char) -> Self {
        Self {
            history,
            commands,
            prefix,
        }
    }

    pub(crate) fn overlay(&self) -> OverlaySelector<'a> {
        OverlaySelector::new(self.prefix, self.commands)
    }
}

/// Result of dispatching a single `KeyAction`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub effects: EffectList,
}

impl DispatchResult {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn changed(text: String) -> Self {
        Self::single(EditorEffect::Change(text))
    }

    pub fn submit(text: String) -> Self {
        Self::single(EditorEffect::Submit(text))
    }

    pub fn interrupt() -> Self {
        Self::single(EditorEffect::Interrupt)
    }

    fn single(effect: EditorEffect) -> Self {
        let mut effects = EffectList::new();
        effects.push(effect);
        Self { effects }
    }

    /// True when the buffer text changed.
    pub fn dirty(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, EditorEffect::Change(_)))
    }

    pub fn submitted(&self) -> Option<&str> {
        self.effects.iter().find_map(|e| match e {
            EditorEffect::Submit(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Apply one action to the editor state and report its effects.
pub fn dispatch(
    action: KeyAction,
    state: &mut EditorState,
    ctx: &DispatchContext<'_>,
    observers: &[Box<dyn ActionObserver>],
) -> DispatchResult {
    // Notify observers (pre-dispatch).
    for obs in observers {
        obs.on_action(&action);
    }
    tracing::trace!(target: "actions.dispatch", kind = action.kind_label(), cursor = state.cursor(), "dispatch");

    match action {
        KeyAction::Return { shift: true } => edit::insert_text(state, "\n"),
        KeyAction::Return { shift: false } => submit::handle_return(state, ctx),
        KeyAction::ArrowUp => motion::handle_vertical(state, ctx, true),
        KeyAction::ArrowDown => motion::handle_vertical(state, ctx, false),
        KeyAction::ArrowLeft { ctrl } => motion::handle_horizontal(state, false, ctrl),
        KeyAction::ArrowRight { ctrl } => motion::handle_horizontal(state, true, ctrl),
        KeyAction::Home => motion::handle_line_bound(state, false),
        KeyAction::End => motion::handle_line_bound(state, true),
        KeyAction::DeleteForward { ctrl } => edit::delete_forward(state, ctrl),
        KeyAction::DeleteBackward { ctrl } => edit::delete_backward(state, ctrl),
        KeyAction::KillToLineEnd => edit::kill_to_line_end(state),
        KeyAction::Char(s) => edit::insert_text(state, &s),
        KeyAction::Cancel => edit::clear(state),
        KeyAction::Interrupt => submit::handle_interrupt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn owned(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(state: &mut EditorState, action: KeyAction) -> DispatchResult {
        let ctx = DispatchContext::new(&[], &[], '/');
        dispatch(action, state, &ctx, &[])
    }

    #[test]
    fn shift_return_inserts_newline_without_submit() {
        let mut st = EditorState::with_text("line");
        let r = run(&mut st, KeyAction::Return { shift: true });
        assert_eq!(st.text(), "line\n");
        assert_eq!(st.cursor(), 5);
        assert!(r.dirty());
        assert_eq!(r.submitted(), None);
    }

    #[test]
    fn return_submits_raw_text_verbatim() {
        let mut st = EditorState::with_text("  spaced  ");
        let r = run(&mut st, KeyAction::Return { shift: false });
        assert_eq!(r.submitted(), Some("  spaced  "));
        assert_eq!(st.text(), "  spaced  ", "dispatch leaves clearing to the caller");
        assert!(!r.dirty());
    }

    #[test]
    fn interrupt_is_reported_without_touching_state() {
        let mut st = EditorState::with_text("keep");
        let r = run(&mut st, KeyAction::Interrupt);
        assert_eq!(r.effects.as_slice(), &[EditorEffect::Interrupt]);
        assert_eq!(st.text(), "keep");
    }

    #[test]
    fn overlay_takes_precedence_over_history() {
        let history = owned(&["older"]);
        let commands = owned(&["help", "hello"]);
        let ctx = DispatchContext::new(&history, &commands, '/');
        let mut st = EditorState::with_text("/h");
        st.buffer.set_cursor(0);
        let r = dispatch(KeyAction::ArrowDown, &mut st, &ctx, &[]);
        assert!(!r.dirty());
        assert_eq!(st.selected_suggestion(), 1);
        let r = dispatch(KeyAction::ArrowUp, &mut st, &ctx, &[]);
        assert!(!r.dirty());
        assert_eq!(st.selected_suggestion(), 0);
        assert_eq!(st.text(), "/h");
        assert!(!st.is_browsing());
    }

    #[test]
    fn observer_invoked() {
        struct CountObs(Arc<Mutex<Vec<&'static str>>>);
        impl crate::ActionObserver for CountObs {
            fn on_action(&self, action: &KeyAction) {
                self.0.lock().unwrap().push(action.kind_label());
            }
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observers: Vec<Box<dyn crate::ActionObserver>> = vec![Box::new(CountObs(seen.clone()))];
        let ctx = DispatchContext::new(&[], &[], '/');
        let mut st = EditorState::new();
        dispatch(KeyAction::Char("a".into()), &mut st, &ctx, &observers);
        dispatch(KeyAction::Home, &mut st, &ctx, &observers);
        assert_eq!(*seen.lock().unwrap(), vec!["char", "home"]);
    }
}
