//! Rope-backed text buffer with a single char-offset cursor.
//!
//! Every offset in this crate is a char index into the buffer. Out of range
//! offsets are clamped to `[0, len_chars]`, never rejected. Lines are split on
//! `\n` only.

use ropey::Rope;
use unicode_width::UnicodeWidthChar;

pub mod motion;

/// Editable text plus the cursor position.
#[derive(Clone, Debug, Default)]
pub struct TextBuffer {
    rope: Rope,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer holding `text` with the cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self { rope, cursor }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, at: usize) {
        self.cursor = self.clamp(at);
    }

    /// Replace the whole text and park the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = self.rope.len_chars();
    }

    pub fn clear(&mut self) {
        self.rope = Rope::new();
        self.cursor = 0;
    }

    pub fn char_at(&self, at: usize) -> Option<char> {
        (at < self.len()).then(|| self.rope.char(at))
    }

    /// Clamp an offset into `[0, len]`.
    pub fn clamp(&self, at: usize) -> usize {
        at.min(self.len())
    }

    /// Splice `s` in at `at`. The cursor lands right after the inserted text.
    pub fn insert(&mut self, at: usize, s: &str) {
        let at = self.clamp(at);
        if s.is_empty() {
            self.cursor = at;
            return;
        }
        self.rope.insert(at, s);
        self.cursor = at + s.chars().count();
    }

    /// Remove `[start, end)` and return the removed text.
    ///
    /// The range is clamped and reordered if reversed. A cursor past the range
    /// shifts left with the text; a cursor inside it lands on `start`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let (start, end) = {
            let a = self.clamp(start);
            let b = self.clamp(end);
            (a.min(b), a.max(b))
        };
        if start == end {
            return String::new();
        }
        let removed = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        if self.cursor >= end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
        removed
    }

    /// Move the cursor by `delta` chars, clamped to the buffer.
    pub fn move_by(&mut self, delta: isize) {
        let target = self.cursor.saturating_add_signed(delta);
        self.cursor = self.clamp(target);
    }

    /// Number of `\n`-separated lines; an empty buffer has one.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Offset of the first char of the line containing `at`.
    pub fn line_start(&self, at: usize) -> usize {
        let line = self.rope.char_to_line(self.clamp(at));
        self.rope.line_to_char(line)
    }

    /// Offset just past the last char of the line containing `at` (before its `\n`).
    pub fn line_end(&self, at: usize) -> usize {
        let line = self.rope.char_to_line(self.clamp(at));
        self.rope.line_to_char(line) + self.line_len(line)
    }

    /// Chars in `line`, excluding the trailing newline. Out of range lines are empty.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let slice = self.rope.line(line);
        let n = slice.len_chars();
        if n > 0 && slice.char(n - 1) == '\n' {
            n - 1
        } else {
            n
        }
    }

    /// Delete from `at` to the end of its line. Returns false when there was nothing to delete.
    pub fn kill_to_line_end(&mut self, at: usize) -> bool {
        let at = self.clamp(at);
        let end = self.line_end(at);
        if end <= at {
            return false;
        }
        self.delete_range(at, end);
        true
    }

    /// `(line, column)` of an offset, both zero based.
    pub fn line_column_of(&self, at: usize) -> (usize, usize) {
        let at = self.clamp(at);
        let line = self.rope.char_to_line(at);
        (line, at - self.rope.line_to_char(line))
    }

    /// Offset of `(line, column)`, with the column clamped to that line's length.
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line) + column.min(self.line_len(line))
    }

    /// Terminal cell column of `at` within its line.
    ///
    /// Control chars count as zero cells.
    pub fn display_column(&self, at: usize) -> usize {
        let at = self.clamp(at);
        let start = self.line_start(at);
        self.rope
            .slice(start..at)
            .chars()
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_text_parks_cursor_at_end() {
        let b = TextBuffer::from_text("héllo");
        assert_eq!(b.len(), 5);
        assert_eq!(b.cursor(), 5);
        assert_eq!(b.text(), "héllo");
    }

    #[test]
    fn insert_advances_cursor_by_char_count() {
        let mut b = TextBuffer::from_text("ac");
        b.insert(1, "日本");
        assert_eq!(b.text(), "a日本c");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn insert_past_end_is_clamped() {
        let mut b = TextBuffer::from_text("ab");
        b.insert(99, "c");
        assert_eq!(b.text(), "abc");
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn delete_range_shifts_or_clamps_cursor() {
        let mut b = TextBuffer::from_text("abcdef");
        b.set_cursor(5);
        assert_eq!(b.delete_range(1, 3), "bc");
        assert_eq!(b.text(), "adef");
        assert_eq!(b.cursor(), 3);

        b.set_cursor(2);
        assert_eq!(b.delete_range(1, 3), "de");
        assert_eq!(b.cursor(), 1);

        assert_eq!(b.delete_range(10, 0), "af");
        assert!(b.is_empty());
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn move_by_clamps_both_ends() {
        let mut b = TextBuffer::from_text("abc");
        b.move_by(-10);
        assert_eq!(b.cursor(), 0);
        b.move_by(2);
        assert_eq!(b.cursor(), 2);
        b.move_by(isize::MAX);
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn line_bounds_split_on_newline() {
        let b = TextBuffer::from_text("ab\ncde\n\nf");
        assert_eq!(b.line_count(), 4);
        assert_eq!(b.line_start(4), 3);
        assert_eq!(b.line_end(4), 6);
        assert_eq!(b.line_start(7), 7);
        assert_eq!(b.line_end(7), 7);
        assert_eq!(b.line_end(0), 2);
        assert_eq!(b.line_start(9), 8);
        assert_eq!(b.line_end(9), 9);
    }

    #[test]
    fn line_column_and_offset_agree() {
        let b = TextBuffer::from_text("ab\ncde\nf");
        assert_eq!(b.line_column_of(0), (0, 0));
        assert_eq!(b.line_column_of(2), (0, 2));
        assert_eq!(b.line_column_of(3), (1, 0));
        assert_eq!(b.line_column_of(5), (1, 2));
        assert_eq!(b.line_column_of(8), (2, 1));
        assert_eq!(b.offset_of(1, 2), 5);
        assert_eq!(b.offset_of(2, 9), 8);
        assert_eq!(b.offset_of(9, 0), 7);
    }

    #[test]
    fn kill_to_line_end_stops_at_newline() {
        let mut b = TextBuffer::from_text("hello world\nnext");
        assert!(b.kill_to_line_end(5));
        assert_eq!(b.text(), "hello\nnext");
        assert!(!b.kill_to_line_end(5));
        assert_eq!(b.text(), "hello\nnext");
    }

    #[test]
    fn display_column_counts_wide_chars() {
        let b = TextBuffer::from_text("x\n日本a");
        assert_eq!(b.display_column(2), 0);
        assert_eq!(b.display_column(4), 4);
        assert_eq!(b.display_column(5), 5);
    }

    #[test]
    fn trailing_newline_opens_an_empty_line() {
        let b = TextBuffer::from_text("ab\n");
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line_column_of(3), (1, 0));
        assert_eq!(b.line_len(1), 0);
    }
}
