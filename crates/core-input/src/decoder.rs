//! Chunked terminal byte decoder.
//!
//! `InputDecoder` turns raw reads into `KeyAction`s. Reads arrive with
//! arbitrary boundaries, so three kinds of state survive between calls:
//!
//! * `escape_buffer`: a trailing escape sequence that has not completed yet.
//!   Invariant: always empty or a strict prefix of a recognized sequence. It is
//!   reset when the sequence completes, when it can no longer complete, when it
//!   outgrows `max_escape_len`, or by `flush_pending`.
//! * `utf8_carry`: up to three trailing bytes of a split multi-byte character.
//! * `paste`: bytes collected between bracketed paste markers. A paste is
//!   capped at `max_paste_len`; past the cap the collected part is committed
//!   and the rest is dropped up to the end marker. A paste whose end marker
//!   never arrives is committed by `flush_pending`.
//!
//! Plain text is never held back by a pending escape: everything before the
//! escape is emitted in the same call.

use crate::escape::{self, ESC, Outcome, PASTE_END, Scan};
use crate::{collapse_newlines, log_paste_commit};
use core_events::{ESCAPES_DROPPED, KEYS_DECODED, KeyAction, PASTE_BYTES, PASTE_SESSIONS};
use std::sync::atomic::Ordering;
use tracing::trace;

/// Default cap for a buffered escape sequence.
pub const DEFAULT_MAX_ESCAPE_LEN: usize = 32;

/// Default cap for one bracketed paste, in bytes.
pub const DEFAULT_MAX_PASTE_LEN: usize = 1 << 20;

const CTRL_A: u8 = 0x01;
const CTRL_C: u8 = 0x03;
const CTRL_E: u8 = 0x05;
const CTRL_H: u8 = 0x08;
const CTRL_K: u8 = 0x0b;
const CTRL_W: u8 = 0x17;
const DEL: u8 = 0x7f;

#[derive(Debug, Clone)]
pub struct InputDecoder {
    escape_buffer: Vec<u8>,
    utf8_carry: Vec<u8>,
    paste: Option<Vec<u8>>,
    /// Set once the current paste outgrew `max_paste_len`.
    paste_overflow: bool,
    max_escape_len: usize,
    max_paste_len: usize,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::with_max_escape_len(DEFAULT_MAX_ESCAPE_LEN)
    }

    pub fn with_max_escape_len(max_escape_len: usize) -> Self {
        Self::with_limits(max_escape_len, DEFAULT_MAX_PASTE_LEN)
    }

    pub fn with_limits(max_escape_len: usize, max_paste_len: usize) -> Self {
        Self {
            escape_buffer: Vec::with_capacity(8),
            utf8_carry: Vec::new(),
            paste: None,
            paste_overflow: false,
            // A cap below the longest sequence we bind would make them undecodable.
            max_escape_len: max_escape_len.max(8),
            max_paste_len: max_paste_len.max(1),
        }
    }

    /// Bytes of the escape sequence currently waiting for more input.
    pub fn pending(&self) -> &[u8] {
        &self.escape_buffer
    }

    /// True while an escape sequence or a paste waits for more bytes.
    pub fn has_pending(&self) -> bool {
        !self.escape_buffer.is_empty() || self.paste.is_some()
    }

    pub fn in_paste(&self) -> bool {
        self.paste.is_some()
    }

    /// Resolve a pending escape after the caller decided no more bytes are coming.
    ///
    /// A bare ESC becomes `KeyAction::Cancel`; any longer prefix is discarded. A
    /// dangling partial UTF-8 character is discarded as well. A paste still
    /// waiting for its end marker is committed as it stands.
    pub fn flush_pending(&mut self) -> Option<KeyAction> {
        self.utf8_carry.clear();
        if let Some(mut buf) = self.paste.take() {
            trace!(target: "input.paste", len = buf.len(), "paste_stalled");
            // Drop a partial end marker.
            if let Some(n) = (1..PASTE_END.len()).rev().find(|&n| buf.ends_with(&PASTE_END[..n])) {
                buf.truncate(buf.len() - n);
            }
            let overflowed = std::mem::take(&mut self.paste_overflow);
            if overflowed {
                return None;
            }
            let mut out = Vec::with_capacity(1);
            emit_paste(&buf, &mut out);
            KEYS_DECODED.fetch_add(out.len() as u64, Ordering::Relaxed);
            return out.pop();
        }
        let pending = std::mem::take(&mut self.escape_buffer);
        match pending.as_slice() {
            [] => None,
            [ESC] => {
                trace!(target: "input.decode", "flush_bare_escape");
                KEYS_DECODED.fetch_add(1, Ordering::Relaxed);
                Some(KeyAction::Cancel)
            }
            other => {
                trace!(target: "input.decode", len = other.len(), "flush_drop_partial");
                ESCAPES_DROPPED.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Decode one chunk of raw terminal input.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<KeyAction> {
        let mut data = std::mem::take(&mut self.escape_buffer);
        data.append(&mut self.utf8_carry);
        data.extend_from_slice(chunk);

        let mut out = Vec::new();
        let mut text = Vec::new();
        let mut i = 0;
        while i < data.len() {
            if self.paste.is_some() {
                i += self.consume_paste(&data[i..], &mut out);
                continue;
            }
            let b = data[i];
            if b == ESC {
                self.flush_text(&mut text, &mut out, false);
                match escape::scan(&data[i..]) {
                    Scan::Complete { len, outcome } => {
                        match outcome {
                            Outcome::Action(action) => out.push(action),
                            Outcome::PasteStart => {
                                trace!(target: "input.paste", "start");
                                PASTE_SESSIONS.fetch_add(1, Ordering::Relaxed);
                                self.paste = Some(Vec::new());
                            }
                            Outcome::Unsupported => {
                                trace!(target: "input.decode", len, "unsupported_sequence");
                                ESCAPES_DROPPED.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        i += len;
                    }
                    Scan::Incomplete => {
                        let rest = &data[i..];
                        if rest.len() > self.max_escape_len {
                            trace!(target: "input.decode", len = rest.len(), "escape_overflow");
                            ESCAPES_DROPPED.fetch_add(1, Ordering::Relaxed);
                        } else {
                            trace!(target: "input.decode", len = rest.len(), "escape_pending");
                            self.escape_buffer.extend_from_slice(rest);
                        }
                        i = data.len();
                    }
                    Scan::Invalid { len } => {
                        trace!(target: "input.decode", len, "escape_discarded");
                        ESCAPES_DROPPED.fetch_add(1, Ordering::Relaxed);
                        i += len;
                    }
                }
                continue;
            }
            if b == b'\r' || b == b'\n' || (b >= 0x20 && b != DEL) {
                text.push(b);
            } else {
                self.flush_text(&mut text, &mut out, false);
                if let Some(action) = map_control(b) {
                    out.push(action);
                }
            }
            i += 1;
        }
        self.flush_text(&mut text, &mut out, true);

        KEYS_DECODED.fetch_add(out.len() as u64, Ordering::Relaxed);
        out
    }

    /// Emit an accumulated text run. A run made only of CR/LF is an Enter key;
    /// anything else is inserted with CR/LF runs collapsed to a space.
    fn flush_text(&mut self, text: &mut Vec<u8>, out: &mut Vec<KeyAction>, at_end: bool) {
        if text.is_empty() {
            return;
        }
        if at_end {
            // error_len() == None: the run ends mid-character; keep the tail for the next chunk.
            let incomplete = std::str::from_utf8(text)
                .err()
                .filter(|err| err.error_len().is_none())
                .map(|err| err.valid_up_to());
            if let Some(valid) = incomplete {
                self.utf8_carry = text.split_off(valid);
            }
        }
        if text.is_empty() {
            return;
        }
        let run = String::from_utf8_lossy(text).into_owned();
        text.clear();
        if run.chars().all(|c| c == '\r' || c == '\n') {
            out.push(KeyAction::Return { shift: false });
        } else {
            out.push(KeyAction::Char(collapse_newlines(&run)));
        }
    }

    /// Feed bytes into an active paste. Returns how many bytes of `data` were consumed.
    fn consume_paste(&mut self, data: &[u8], out: &mut Vec<KeyAction>) -> usize {
        let Some(buf) = self.paste.as_mut() else {
            return 0;
        };
        let before = buf.len();
        // The end marker may straddle the previous read.
        let search_from = before.saturating_sub(PASTE_END.len() - 1);
        buf.extend_from_slice(data);
        if let Some(pos) = buf[search_from..]
            .windows(PASTE_END.len())
            .position(|w| w == PASTE_END)
        {
            let end = search_from + pos;
            let consumed = end + PASTE_END.len() - before;
            buf.truncate(end);
            let content = self.paste.take().unwrap_or_default();
            trace!(target: "input.paste", "end");
            if !std::mem::take(&mut self.paste_overflow) {
                emit_paste(&content, out);
            }
            return consumed;
        }

        // Keep only enough of the tail to spot a split end marker.
        let window = PASTE_END.len() - 1;
        if self.paste_overflow {
            let excess = buf.len().saturating_sub(window);
            buf.drain(..excess);
        } else if buf.len() > self.max_paste_len {
            let mut cut = self.max_paste_len;
            while cut > 0 && (buf[cut] & 0xc0) == 0x80 {
                cut -= 1;
            }
            let rest = buf.split_off(cut);
            let content = std::mem::replace(buf, rest);
            let excess = buf.len().saturating_sub(window);
            buf.drain(..excess);
            self.paste_overflow = true;
            trace!(target: "input.paste", cap = self.max_paste_len, "paste_overflow");
            emit_paste(&content, out);
        }
        data.len()
    }
}

/// Insert a committed paste: control bytes other than tab and line breaks
/// are stripped, line breaks collapse to spaces.
fn emit_paste(content: &[u8], out: &mut Vec<KeyAction>) {
    let raw = String::from_utf8_lossy(content);
    let s: String = raw
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'))
        .collect();
    if s.is_empty() {
        return;
    }
    PASTE_BYTES.fetch_add(s.len() as u64, Ordering::Relaxed);
    log_paste_commit(&s);
    out.push(KeyAction::Char(collapse_newlines(&s)));
}

fn map_control(b: u8) -> Option<KeyAction> {
    match b {
        DEL | CTRL_H => Some(KeyAction::DeleteBackward { ctrl: false }),
        CTRL_W => Some(KeyAction::DeleteBackward { ctrl: true }),
        CTRL_K => Some(KeyAction::KillToLineEnd),
        CTRL_A => Some(KeyAction::Home),
        CTRL_E => Some(KeyAction::End),
        CTRL_C => Some(KeyAction::Interrupt),
        _ => {
            trace!(target: "input.decode", byte = b, "control_dropped");
            None
        }
    }
}
