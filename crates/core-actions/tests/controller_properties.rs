//! Invariants that must hold after any sequence of actions.

mod common;

use common::owned;
use core_actions::{DispatchContext, dispatch};
use core_events::{EditorEffect, KeyAction};
use core_state::{EditorState, OverlaySelector};
use proptest::prelude::*;

fn any_action() -> impl Strategy<Value = KeyAction> {
    prop_oneof![
        "[a-c /é\n]{0,4}".prop_map(KeyAction::Char),
        any::<bool>().prop_map(|shift| KeyAction::Return { shift }),
        Just(KeyAction::ArrowUp),
        Just(KeyAction::ArrowDown),
        any::<bool>().prop_map(|ctrl| KeyAction::ArrowLeft { ctrl }),
        any::<bool>().prop_map(|ctrl| KeyAction::ArrowRight { ctrl }),
        Just(KeyAction::Home),
        Just(KeyAction::End),
        any::<bool>().prop_map(|ctrl| KeyAction::DeleteForward { ctrl }),
        any::<bool>().prop_map(|ctrl| KeyAction::DeleteBackward { ctrl }),
        Just(KeyAction::KillToLineEnd),
        Just(KeyAction::Cancel),
        Just(KeyAction::Interrupt),
    ]
}

proptest! {
    #[test]
    fn state_invariants_hold(actions in prop::collection::vec(any_action(), 0..60)) {
        let history = owned(&["hello", "/help", "two\nlines"]);
        let commands = owned(&["help", "history", "hello"]);
        let ctx = DispatchContext::new(&history, &commands, '/');
        let overlay = OverlaySelector::new('/', &commands);
        let mut st = EditorState::new();

        for action in actions {
            let before = st.text();
            let mutating = matches!(
                action,
                KeyAction::Char(_)
                    | KeyAction::Return { shift: true }
                    | KeyAction::DeleteForward { .. }
                    | KeyAction::DeleteBackward { .. }
                    | KeyAction::KillToLineEnd
                    | KeyAction::Cancel
            );
            let result = dispatch(action, &mut st, &ctx, &[]);

            prop_assert!(st.cursor() <= st.buffer.len());
            if let Some(i) = st.history_index() {
                prop_assert!(i < history.len());
            }
            if let Some(matches) = overlay.filtered(&st.text()) && !matches.is_empty() {
                prop_assert!(st.selected_suggestion() < matches.len());
            }
            let changed = st.text() != before;
            prop_assert_eq!(result.dirty(), changed, "Change effect iff the text changed");
            if mutating && changed {
                prop_assert_eq!(st.history_index(), None);
                prop_assert_eq!(st.selected_suggestion(), 0);
            }
            let submits = result
                .effects
                .iter()
                .filter(|e| matches!(e, EditorEffect::Submit(_)))
                .count();
            prop_assert!(submits <= 1);
        }
    }
}
