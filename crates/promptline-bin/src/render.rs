//! Inline prompt rendering.
//!
//! The prompt is drawn below earlier output in the normal screen buffer. Each
//! redraw moves back to the first prompt row, clears to the end of the screen
//! and paints the text rows followed by the command suggestion rows. Output
//! printed for a submission goes above the prompt, which is then redrawn.
//!
//! When stdout is not a terminal nothing but the submission output is written.

use anyhow::Result;
use core_state::{EditorState, OverlaySelector};
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use unicode_width::UnicodeWidthChar;

pub const PROMPT: &str = "> ";
const CONTINUATION: &str = "  ";
pub const MAX_SUGGESTIONS: usize = 6;

/// One laid out prompt. Rows are logical; heights and the cursor are physical
/// (after wrapping at the terminal width).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<String>,
    pub height: usize,
    pub cursor_row: usize,
    pub cursor_col: u16,
}

pub fn layout(state: &EditorState, overlay: &OverlaySelector<'_>, columns: u16) -> Frame {
    let cols = usize::from(columns.max(1));
    let text = state.text();
    let (cursor_line, _) = state.buffer.line_column_of(state.cursor());
    let cursor_cells = PROMPT.len() + state.buffer.display_column(state.cursor());

    let mut rows = Vec::new();
    let mut height = 0;
    let mut cursor_row = 0;
    let mut cursor_col = 0;
    for (i, line) in text.split('\n').enumerate() {
        let lead = if i == 0 { PROMPT } else { CONTINUATION };
        let row = format!("{lead}{}", visible(line));
        let physical = physical_rows(cell_width(&row), cols);
        if i == cursor_line {
            // Cursor just past a full last row sits in the terminal's pending-wrap column.
            let (wrap_row, col) = match cursor_cells / cols {
                r if r < physical => (r, cursor_cells % cols),
                _ => (physical - 1, cols - 1),
            };
            cursor_row = height + wrap_row;
            cursor_col = u16::try_from(col).unwrap_or(u16::MAX);
        }
        height += physical;
        rows.push(row);
    }
    for row in suggestion_rows(state, overlay, cols) {
        height += 1;
        rows.push(row);
    }
    Frame {
        rows,
        height,
        cursor_row,
        cursor_col,
    }
}

fn suggestion_rows(state: &EditorState, overlay: &OverlaySelector<'_>, cols: usize) -> Vec<String> {
    let Some(matches) = overlay.filtered(&state.text()) else {
        return Vec::new();
    };
    if matches.is_empty() {
        return vec![truncate("  no matching commands", cols - 1)];
    }
    let selected = state.selected_suggestion().min(matches.len() - 1);
    let start = (selected + 1).saturating_sub(MAX_SUGGESTIONS);
    matches
        .iter()
        .enumerate()
        .skip(start)
        .take(MAX_SUGGESTIONS)
        .map(|(i, name)| {
            let marker = if i == selected { '›' } else { ' ' };
            truncate(&format!("{marker} {}{name}", overlay.prefix()), cols - 1)
        })
        .collect()
}

/// Control chars occupy no cell and are never written to the terminal.
fn visible(line: &str) -> String {
    line.chars().filter(|c| !c.is_control()).collect()
}

fn cell_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

fn physical_rows(cells: usize, cols: usize) -> usize {
    cells.div_ceil(cols).max(1)
}

fn truncate(s: &str, max_cells: usize) -> String {
    let mut used = 0;
    s.chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= max_cells
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum ScreenCmd {
    Up(u16),
    Column(u16),
    ClearBelow,
    Print(String),
    NewLine,
}

/// Ordered terminal commands for one update, flushed at once.
#[derive(Default)]
struct ScreenWriter {
    cmds: Vec<ScreenCmd>,
}

impl ScreenWriter {
    fn up(&mut self, n: usize) {
        // A zero count still moves one row on most terminals.
        if n > 0 {
            self.cmds
                .push(ScreenCmd::Up(u16::try_from(n).unwrap_or(u16::MAX)));
        }
    }

    fn column(&mut self, col: u16) {
        self.cmds.push(ScreenCmd::Column(col));
    }

    fn clear_below(&mut self) {
        self.cmds.push(ScreenCmd::ClearBelow);
    }

    fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(ScreenCmd::Print(s));
        }
    }

    fn newline(&mut self) {
        self.cmds.push(ScreenCmd::NewLine);
    }

    fn flush(self, out: &mut impl Write, raw: bool) -> Result<()> {
        for c in self.cmds {
            match c {
                ScreenCmd::Up(n) => queue!(out, MoveUp(n))?,
                ScreenCmd::Column(col) => queue!(out, MoveToColumn(col))?,
                ScreenCmd::ClearBelow => queue!(out, Clear(ClearType::FromCursorDown))?,
                ScreenCmd::Print(s) => queue!(out, Print(s))?,
                // Raw mode disables the terminal's own CR on LF.
                ScreenCmd::NewLine => queue!(out, Print(if raw { "\r\n" } else { "\n" }))?,
            }
        }
        out.flush()?;
        Ok(())
    }
}

pub struct InlineRenderer<W: Write> {
    out: W,
    interactive: bool,
    columns: u16,
    /// Physical row of the terminal cursor inside the frame on screen, if any.
    drawn_cursor_row: Option<usize>,
}

impl<W: Write> InlineRenderer<W> {
    pub fn new(out: W, interactive: bool, columns: u16) -> Self {
        Self {
            out,
            interactive,
            columns: columns.max(1),
            drawn_cursor_row: None,
        }
    }

    pub fn set_columns(&mut self, columns: u16) {
        self.columns = columns.max(1);
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    fn erase(&mut self, w: &mut ScreenWriter) {
        if let Some(row) = self.drawn_cursor_row.take() {
            w.up(row);
            w.column(0);
            w.clear_below();
        }
    }

    /// Repaint the prompt for the current state.
    pub fn draw(&mut self, state: &EditorState, overlay: &OverlaySelector<'_>) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let frame = layout(state, overlay, self.columns);
        let mut w = ScreenWriter::default();
        self.erase(&mut w);
        for (i, row) in frame.rows.iter().enumerate() {
            if i > 0 {
                w.newline();
            }
            w.print(row.as_str());
        }
        w.up(frame.height - 1 - frame.cursor_row);
        w.column(frame.cursor_col);
        w.flush(&mut self.out, true)?;
        self.drawn_cursor_row = Some(frame.cursor_row);
        tracing::trace!(target: "runtime.render", rows = frame.rows.len(), height = frame.height, "prompt_drawn");
        Ok(())
    }

    /// Print output lines where the prompt was. The caller redraws afterwards.
    pub fn print_lines(&mut self, lines: &[String]) -> Result<()> {
        let mut w = ScreenWriter::default();
        self.erase(&mut w);
        for line in lines {
            w.print(line.as_str());
            w.newline();
        }
        w.flush(&mut self.out, self.interactive)
    }

    /// Remove the prompt before the terminal is handed back.
    pub fn clear(&mut self) -> Result<()> {
        let mut w = ScreenWriter::default();
        self.erase(&mut w);
        w.flush(&mut self.out, self.interactive)
    }
}
