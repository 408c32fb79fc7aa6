//! Byte-level facade over the decoder and the dispatcher.

use crate::dispatcher::{DispatchContext, DispatchResult, dispatch};
use crate::ActionObserver;
use core_events::{EditorEffect, KeyAction};
use core_input::{DEFAULT_MAX_ESCAPE_LEN, DEFAULT_MAX_PASTE_LEN, InputDecoder};
use core_state::{DEFAULT_COMMAND_PREFIX, EditorState};

/// Receives the editor's outputs, in action order.
pub trait EditorSink {
    /// The text changed. Called once per mutating action.
    fn on_change(&mut self, _text: &str) {}
    /// Return was accepted. Called exactly once per accepted Return.
    fn on_submit(&mut self, text: &str);
    fn on_interrupt(&mut self) {}
}

/// Records every callback as an `EditorEffect`.
impl EditorSink for Vec<EditorEffect> {
    fn on_change(&mut self, text: &str) {
        self.push(EditorEffect::Change(text.to_string()));
    }
    fn on_submit(&mut self, text: &str) {
        self.push(EditorEffect::Submit(text.to_string()));
    }
    fn on_interrupt(&mut self) {
        self.push(EditorEffect::Interrupt);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    pub command_prefix: char,
    pub max_escape_len: usize,
    pub max_paste_len: usize,
    /// Empty the buffer (and end browsing) right after `on_submit`.
    pub clear_on_submit: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            command_prefix: DEFAULT_COMMAND_PREFIX,
            max_escape_len: DEFAULT_MAX_ESCAPE_LEN,
            max_paste_len: DEFAULT_MAX_PASTE_LEN,
            clear_on_submit: true,
        }
    }
}

/// One input session: decoder, editor state and observers.
pub struct LineEditor {
    decoder: InputDecoder,
    state: EditorState,
    options: EditorOptions,
    observers: Vec<Box<dyn ActionObserver>>,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

impl LineEditor {
    pub fn new(options: EditorOptions) -> Self {
        Self {
            decoder: InputDecoder::with_limits(options.max_escape_len, options.max_paste_len),
            state: EditorState::new(),
            options,
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn text(&self) -> String {
        self.state.text()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }

    /// True while an escape sequence or a paste is waiting for more bytes.
    pub fn has_pending(&self) -> bool {
        self.decoder.has_pending()
    }

    pub fn in_paste(&self) -> bool {
        self.decoder.in_paste()
    }

    pub fn add_observer(&mut self, observer: Box<dyn ActionObserver>) {
        self.observers.push(observer);
    }

    /// Decode one raw chunk and apply every resulting action in order.
    /// Returns the number of actions applied.
    pub fn feed(
        &mut self,
        bytes: &[u8],
        history: &[String],
        commands: &[String],
        sink: &mut impl EditorSink,
    ) -> usize {
        let actions = self.decoder.decode(bytes);
        let n = actions.len();
        for action in actions {
            self.apply(action, history, commands, sink);
        }
        n
    }

    /// Resolve an idle pending escape or stalled paste. Returns true if it
    /// produced an action.
    pub fn flush_pending(
        &mut self,
        history: &[String],
        commands: &[String],
        sink: &mut impl EditorSink,
    ) -> bool {
        match self.decoder.flush_pending() {
            Some(action) => {
                self.apply(action, history, commands, sink);
                true
            }
            None => false,
        }
    }

    /// Dispatch one already decoded action.
    pub fn apply(
        &mut self,
        action: KeyAction,
        history: &[String],
        commands: &[String],
        sink: &mut impl EditorSink,
    ) {
        let ctx = DispatchContext::new(history, commands, self.options.command_prefix);
        let result = dispatch(action, &mut self.state, &ctx, &self.observers);
        self.deliver(result, sink);
    }

    fn deliver(&mut self, result: DispatchResult, sink: &mut impl EditorSink) {
        for effect in result.effects {
            match effect {
                EditorEffect::Change(text) => sink.on_change(&text),
                EditorEffect::Submit(text) => {
                    sink.on_submit(&text);
                    if self.options.clear_on_submit {
                        let had_text = !self.state.buffer.is_empty();
                        self.state.reset();
                        if had_text {
                            sink.on_change("");
                        }
                    }
                }
                EditorEffect::Interrupt => sink.on_interrupt(),
            }
        }
    }
}
