//! Terminal input decoding and the async stdin reader.

mod async_service;
mod decoder;
mod escape;

pub use async_service::{AsyncInputShutdown, spawn_async_input};
pub use decoder::{DEFAULT_MAX_ESCAPE_LEN, DEFAULT_MAX_PASTE_LEN, InputDecoder};

#[inline]
pub(crate) fn log_paste_commit(content: &str) {
    tracing::debug!(
        target: "input.paste",
        size_bytes = content.len(),
        char_count = content.chars().count(),
        "paste_commit"
    );
}

/// Collapse every run of CR/LF characters into a single space.
///
/// Applied to multi-char text deliveries so a paste can neither split into
/// several logical lines nor submit early.
pub fn collapse_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if c == '\r' || c == '\n' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
