//! Terminal mode management for an inline prompt.
//!
//! The prompt lives in the normal screen buffer below earlier output, so there
//! is no alternate screen. Entering switches to raw mode and, when asked,
//! bracketed paste. Leaving undoes both.

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;
use tracing::debug;

pub mod capabilities;
pub use capabilities::TerminalCapabilities;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

pub struct CrosstermBackend {
    entered: bool,
    bracketed_paste: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CrosstermBackend {
    pub fn new(bracketed_paste: bool) -> Self {
        Self {
            entered: false,
            bracketed_paste,
        }
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            if self.bracketed_paste {
                execute!(stdout(), EnableBracketedPaste)?;
            }
            self.entered = true;
            debug!(target: "runtime", bracketed_paste = self.bracketed_paste, "terminal_entered");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            if self.bracketed_paste {
                execute!(stdout(), DisableBracketedPaste)?;
            }
            execute!(stdout(), Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "runtime", "terminal_left");
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_without_enter_is_a_no_op() {
        let mut backend = CrosstermBackend::new(false);
        assert!(!backend.is_entered());
        backend.leave().unwrap();
        assert!(!backend.is_entered());
    }
}
