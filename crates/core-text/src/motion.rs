//! Cursor motion helpers.
//!
//! Pure functions over a `TextBuffer` that compute a target offset. They never
//! mutate; callers decide whether the result moves the cursor or bounds a
//! deletion. A "word" is a maximal run of non-whitespace chars.

use crate::TextBuffer;

fn is_space_at(buf: &TextBuffer, at: usize) -> bool {
    buf.char_at(at).is_some_and(char::is_whitespace)
}

fn is_word_at(buf: &TextBuffer, at: usize) -> bool {
    buf.char_at(at).is_some_and(|c| !c.is_whitespace())
}

/// Start of the word left of `from`: skip whitespace leftward, then non-whitespace.
pub fn word_backward(buf: &TextBuffer, from: usize) -> usize {
    let mut i = buf.clamp(from);
    while i > 0 && is_space_at(buf, i - 1) {
        i -= 1;
    }
    while i > 0 && is_word_at(buf, i - 1) {
        i -= 1;
    }
    i
}

/// Start of the next word: skip non-whitespace rightward, then whitespace.
pub fn word_forward(buf: &TextBuffer, from: usize) -> usize {
    let mut i = buf.clamp(from);
    while is_word_at(buf, i) {
        i += 1;
    }
    while is_space_at(buf, i) {
        i += 1;
    }
    i
}

/// End of the span removed by a forward word delete.
///
/// Leading whitespace, the word itself and the whitespace after it, so the
/// next word slides into place under the cursor.
pub fn word_delete_end(buf: &TextBuffer, from: usize) -> usize {
    let mut i = buf.clamp(from);
    while is_space_at(buf, i) {
        i += 1;
    }
    word_forward(buf, i)
}

/// Same column one line up. From the first line this goes to offset 0.
pub fn line_up(buf: &TextBuffer, at: usize) -> usize {
    let (line, column) = buf.line_column_of(at);
    if line == 0 {
        return 0;
    }
    buf.offset_of(line - 1, column)
}

/// Same column one line down. From the last line this goes to the end of the buffer.
pub fn line_down(buf: &TextBuffer, at: usize) -> usize {
    let (line, column) = buf.line_column_of(at);
    if line + 1 >= buf.line_count() {
        return buf.len();
    }
    buf.offset_of(line + 1, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "This is a sample text for testing";

    #[test]
    fn word_backward_skips_space_then_word() {
        let b = TextBuffer::from_text(SAMPLE);
        assert_eq!(word_backward(&b, 10), 8);
        assert_eq!(word_backward(&b, 8), 5);
        assert_eq!(word_backward(&b, 3), 0);
        assert_eq!(word_backward(&b, 0), 0);
    }

    #[test]
    fn word_forward_skips_word_then_space() {
        let b = TextBuffer::from_text(SAMPLE);
        assert_eq!(word_forward(&b, 0), 5);
        assert_eq!(word_forward(&b, 4), 5);
        assert_eq!(word_forward(&b, 10), 17);
        assert_eq!(word_forward(&b, 27), b.len());
        assert_eq!(word_forward(&b, b.len()), b.len());
    }

    #[test]
    fn word_delete_end_covers_leading_and_trailing_space() {
        let b = TextBuffer::from_text("a   bc  d");
        assert_eq!(word_delete_end(&b, 1), 8);
        assert_eq!(word_delete_end(&b, 4), 8);
        assert_eq!(word_delete_end(&b, 8), 9);
    }

    #[test]
    fn newline_counts_as_whitespace() {
        let b = TextBuffer::from_text("one\ntwo");
        assert_eq!(word_forward(&b, 0), 4);
        assert_eq!(word_backward(&b, 4), 0);
    }

    #[test]
    fn delete_word_forward_mid_sentence() {
        let mut b = TextBuffer::from_text(SAMPLE);
        let end = word_delete_end(&b, 10);
        b.delete_range(10, end);
        assert_eq!(b.text(), "This is a text for testing");
    }

    #[test]
    fn delete_word_backward_mid_sentence() {
        let mut b = TextBuffer::from_text(SAMPLE);
        let start = word_backward(&b, 10);
        b.delete_range(start, 10);
        assert_eq!(b.text(), "This is sample text for testing");
    }

    #[test]
    fn vertical_moves_keep_column_clamped() {
        let b = TextBuffer::from_text("abcdef\nxy\nlonger line");
        // (0,5) -> (1,2) clamped to "xy"
        assert_eq!(line_down(&b, 5), 9);
        // (1,2) -> (2,2)
        assert_eq!(line_down(&b, 9), 12);
        // (2,8) -> (1,2) clamped
        assert_eq!(line_up(&b, 18), 9);
        assert_eq!(line_up(&b, 9), 2);
    }

    #[test]
    fn vertical_moves_at_edges_go_to_buffer_ends() {
        let b = TextBuffer::from_text("first\nlast");
        assert_eq!(line_up(&b, 3), 0);
        assert_eq!(line_down(&b, 7), b.len());
        let single = TextBuffer::from_text("only");
        assert_eq!(line_up(&single, 4), 0);
        assert_eq!(line_down(&single, 0), 4);
    }
}
