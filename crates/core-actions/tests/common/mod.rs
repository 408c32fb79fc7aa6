#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{EditorOptions, LineEditor};
use core_events::EditorEffect;

pub fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Editor holding `text` with the cursor at `cursor`.
pub fn editor_at(text: &str, cursor: usize) -> LineEditor {
    let mut ed = LineEditor::new(EditorOptions::default());
    ed.state_mut().buffer.set_text(text);
    ed.state_mut().buffer.set_cursor(cursor);
    ed
}

/// Session with fixed history and command snapshots and a recording sink.
pub struct Session {
    pub editor: LineEditor,
    pub history: Vec<String>,
    pub commands: Vec<String>,
    pub effects: Vec<EditorEffect>,
}

impl Session {
    pub fn new(history: &[&str], commands: &[&str]) -> Self {
        Self {
            editor: LineEditor::default(),
            history: owned(history),
            commands: owned(commands),
            effects: Vec::new(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        self.editor
            .feed(bytes, &self.history, &self.commands, &mut self.effects)
    }

    pub fn text(&self) -> String {
        self.editor.text()
    }

    pub fn take_effects(&mut self) -> Vec<EditorEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn submissions(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                EditorEffect::Submit(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}
