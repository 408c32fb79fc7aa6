use super::{DispatchContext, DispatchResult};
use core_events::SUBMISSIONS;
use core_state::EditorState;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Plain Return: overlay commit when the prefix is typed, raw text otherwise.
pub(crate) fn handle_return(state: &EditorState, ctx: &DispatchContext<'_>) -> DispatchResult {
    let overlay = ctx.overlay();
    let text = state.text();
    let (payload, via_overlay) = if overlay.is_active(&text) {
        (overlay.commit(state), true)
    } else {
        (text, false)
    };
    SUBMISSIONS.fetch_add(1, Ordering::Relaxed);
    debug!(target: "actions.dispatch", via_overlay, len = payload.len(), "submit");
    DispatchResult::submit(payload)
}

pub(crate) fn handle_interrupt() -> DispatchResult {
    debug!(target: "actions.dispatch", "interrupt");
    DispatchResult::interrupt()
}
