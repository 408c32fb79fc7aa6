//! Terminal capability probing.
//!
//! Detection runs once at startup. When stdin is not a terminal (bytes piped
//! in from a file or a test harness) the binary skips raw mode entirely and
//! the renderer falls back to plain line output.

use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    /// stdin is a TTY, so raw mode and bracketed paste make sense.
    pub interactive_input: bool,
    /// stdout is a TTY, so cursor movement sequences make sense.
    pub interactive_output: bool,
    pub columns: u16,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        let interactive_input = std::io::stdin().is_terminal();
        let interactive_output = std::io::stdout().is_terminal();
        let columns = crossterm::terminal::size().map_or(80, |(cols, _)| cols.max(1));
        Self {
            interactive_input,
            interactive_output,
            columns,
        }
    }

    /// Raw mode only when both ends are a terminal.
    pub fn wants_raw_mode(&self) -> bool {
        self.interactive_input && self.interactive_output
    }
}
