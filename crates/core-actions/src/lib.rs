//! Line editor controller: turns decoded `KeyAction`s into state changes and
//! caller-visible effects.
//!
//! `dispatcher::dispatch` is the pure single-action entry point. `LineEditor`
//! wraps it with an `InputDecoder` so callers can feed raw terminal bytes and
//! receive callbacks through an `EditorSink`.

pub mod dispatcher;
mod editor;

pub use dispatcher::{DispatchContext, DispatchResult, dispatch};
pub use editor::{EditorOptions, EditorSink, LineEditor};

use core_events::KeyAction;

/// Hook notified of every action before it is dispatched. Must not block.
pub trait ActionObserver: Send + Sync {
    fn on_action(&self, action: &KeyAction);
}
