//! Built-in slash commands and the session history they operate on.

use tracing::{debug, info};

/// Entries kept in the session history; the oldest are dropped first.
pub const MAX_HISTORY: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print.
    Silent,
    Lines(Vec<String>),
    Exit,
}

pub struct CommandHost {
    prefix: char,
    commands: Vec<String>,
    history: Vec<String>,
}

impl CommandHost {
    pub fn new(prefix: char, commands: Vec<String>) -> Self {
        Self {
            prefix,
            commands,
            history: Vec::new(),
        }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Submitted entries, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Handle one submitted entry.
    ///
    /// Blank entries are ignored and never recorded. Everything else is
    /// appended to history (consecutive duplicates collapse) before it runs.
    pub fn handle_submit(&mut self, text: &str) -> Reply {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(target: "runtime.commands", "blank_submission_ignored");
            return Reply::Silent;
        }
        self.record(text);

        let Some(rest) = trimmed.strip_prefix(self.prefix) else {
            return Reply::Lines(echo(text));
        };
        let name = rest.split_whitespace().next().unwrap_or("");
        info!(target: "runtime.commands", name_len = name.len(), "command");
        match name {
            "" => Reply::Lines(vec![format!("type {}help for a list of commands", self.prefix)]),
            "help" => Reply::Lines(self.help()),
            "history" => Reply::Lines(self.listing()),
            "hello" => Reply::Lines(vec!["hello there!".to_string()]),
            "clear" => {
                self.history.clear();
                Reply::Lines(vec!["history cleared".to_string()])
            }
            "exit" => Reply::Exit,
            other if self.commands.iter().any(|c| c == other) => {
                Reply::Lines(vec![format!("{}{other}: no handler registered", self.prefix)])
            }
            other => Reply::Lines(vec![format!("unknown command: {}{other}", self.prefix)]),
        }
    }

    fn record(&mut self, text: &str) {
        if self.history.last().is_some_and(|last| last == text) {
            return;
        }
        self.history.push(text.to_string());
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }

    fn help(&self) -> Vec<String> {
        let mut lines = vec!["commands:".to_string()];
        lines.extend(self.commands.iter().map(|c| format!("  {}{c}", self.prefix)));
        lines.push("Up/Down browse history, Shift+Enter inserts a newline".to_string());
        lines
    }

    fn listing(&self) -> Vec<String> {
        self.history
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{:>4}  {}", i + 1, entry.replace('\n', " ⏎ ")))
            .collect()
    }
}

fn echo(text: &str) -> Vec<String> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("you: {line}")
            } else {
                format!("     {line}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host() -> CommandHost {
        let names = ["help", "history", "hello", "clear", "exit", "deploy"];
        CommandHost::new('/', names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn blank_entries_are_ignored() {
        let mut h = host();
        assert_eq!(h.handle_submit("   "), Reply::Silent);
        assert_eq!(h.handle_submit(""), Reply::Silent);
        assert!(h.history().is_empty());
    }

    #[test]
    fn messages_are_echoed_and_recorded() {
        let mut h = host();
        assert_eq!(
            h.handle_submit("hi\nthere"),
            Reply::Lines(vec!["you: hi".into(), "     there".into()])
        );
        h.handle_submit("hi\nthere");
        h.handle_submit("/hello");
        assert_eq!(h.history(), ["hi\nthere", "/hello"]);
    }

    #[test]
    fn builtins_run() {
        let mut h = host();
        assert_eq!(h.handle_submit("/exit"), Reply::Exit);
        let Reply::Lines(help) = h.handle_submit("/help") else {
            panic!("help prints lines");
        };
        assert!(help.contains(&"  /deploy".to_string()));
        assert_eq!(
            h.handle_submit("/history"),
            Reply::Lines(vec!["   1  /exit".into(), "   2  /help".into(), "   3  /history".into()])
        );
        h.handle_submit("/clear");
        assert!(h.history().is_empty());
    }

    #[test]
    fn unknown_and_unhandled_commands_are_reported() {
        let mut h = host();
        assert_eq!(
            h.handle_submit("/nope"),
            Reply::Lines(vec!["unknown command: /nope".into()])
        );
        assert_eq!(
            h.handle_submit("/deploy now"),
            Reply::Lines(vec!["/deploy: no handler registered".into()])
        );
    }

    #[test]
    fn history_is_bounded() {
        let mut h = host();
        for i in 0..MAX_HISTORY + 3 {
            h.handle_submit(&format!("m{i}"));
        }
        assert_eq!(h.history().len(), MAX_HISTORY);
        assert_eq!(h.history()[0], "m3");
    }
}
