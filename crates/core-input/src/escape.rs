//! Escape sequence scanner.
//!
//! Pure function over a byte slice that starts with ESC. Recognized forms:
//! * CSI `ESC [ <digits/;> <final>`: arrows, Home/End, tilde keys, CSI-u Enter,
//!   bracketed paste markers.
//! * SS3 `ESC O <final>`: Home/End and application-mode arrows.
//! * Meta literals `ESC f`, `ESC b`, `ESC CR`.
//!
//! CSI sequences with private markers or intermediates (`ESC [ ? 25 h`) are
//! recognized only so they can be swallowed whole.
//!
//! The scanner never allocates on the hot path and never looks past the first
//! final byte, so the caller can resume scanning right after `len`.

use core_events::{KeyAction, ModMask};
use smallvec::SmallVec;

pub(crate) const ESC: u8 = 0x1b;
pub(crate) const PASTE_END: &[u8] = b"\x1b[201~";

/// What a complete sequence resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Action(KeyAction),
    PasteStart,
    /// Well formed but not bound to any action (F-keys, Insert, stray paste end, focus reports).
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scan {
    /// `len` bytes form one sequence.
    Complete { len: usize, outcome: Outcome },
    /// Every byte so far is a strict prefix of a recognized sequence.
    Incomplete,
    /// The first `len` bytes can never become a recognized sequence; drop them.
    Invalid { len: usize },
}

/// Scan one escape sequence at the start of `bytes` (`bytes[0] == ESC`).
pub(crate) fn scan(bytes: &[u8]) -> Scan {
    debug_assert_eq!(bytes.first(), Some(&ESC));
    let Some(&second) = bytes.get(1) else {
        return Scan::Incomplete;
    };
    match second {
        b'[' => scan_csi(bytes),
        b'O' => scan_ss3(bytes),
        b'f' => complete(2, KeyAction::ArrowRight { ctrl: true }),
        b'b' => complete(2, KeyAction::ArrowLeft { ctrl: true }),
        b'\r' => complete(2, KeyAction::Return { shift: true }),
        // Alt+<printable> chords we do not bind.
        0x20..=0x7e => Scan::Invalid { len: 2 },
        // ESC ESC, ESC + control or ESC + UTF-8 lead: drop only the ESC and rescan the rest.
        _ => Scan::Invalid { len: 1 },
    }
}

fn complete(len: usize, action: KeyAction) -> Scan {
    Scan::Complete {
        len,
        outcome: Outcome::Action(action),
    }
}

fn is_final(b: u8) -> bool {
    (0x40..=0x7e).contains(&b)
}

fn scan_ss3(bytes: &[u8]) -> Scan {
    let Some(&fin) = bytes.get(2) else {
        return Scan::Incomplete;
    };
    let action = match fin {
        b'H' => KeyAction::Home,
        b'F' => KeyAction::End,
        b'A' => KeyAction::ArrowUp,
        b'B' => KeyAction::ArrowDown,
        b'C' => KeyAction::ArrowRight { ctrl: false },
        b'D' => KeyAction::ArrowLeft { ctrl: false },
        b if is_final(b) => {
            return Scan::Complete {
                len: 3,
                outcome: Outcome::Unsupported,
            };
        }
        _ => return Scan::Invalid { len: 2 },
    };
    complete(3, action)
}

fn scan_csi(bytes: &[u8]) -> Scan {
    let mut i = 2;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b';') {
        i += 1;
    }
    let Some(&fin) = bytes.get(i) else {
        return Scan::Incomplete;
    };
    if is_final(fin) {
        return Scan::Complete {
            len: i + 1,
            outcome: resolve_csi(&bytes[2..i], fin),
        };
    }
    if (0x20..=0x3f).contains(&fin) {
        // Private markers / intermediates: swallowed through the final byte.
        for (j, &b) in bytes.iter().enumerate().skip(i) {
            if is_final(b) {
                return Scan::Complete {
                    len: j + 1,
                    outcome: Outcome::Unsupported,
                };
            }
            if !(0x20..=0x3f).contains(&b) {
                return Scan::Invalid { len: j };
            }
        }
        return Scan::Incomplete;
    }
    Scan::Invalid { len: i }
}

/// Parse `;`-separated numeric params. Empty or overflowing fields become `None`.
fn parse_params(raw: &[u8]) -> SmallVec<[Option<u32>; 4]> {
    if raw.is_empty() {
        return SmallVec::new();
    }
    raw.split(|&b| b == b';')
        .map(|field| {
            std::str::from_utf8(field)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
        })
        .collect()
}

fn resolve_csi(raw_params: &[u8], fin: u8) -> Outcome {
    let params = parse_params(raw_params);
    let first = params.first().copied().flatten();
    let second = params.get(1).copied().flatten();
    match fin {
        b'A' | b'B' | b'C' | b'D' | b'H' | b'F' => {
            // Modifier is the second param; a lone param on these finals is the modifier.
            let modifier = match params.len() {
                0 => 1,
                1 => first.unwrap_or(1),
                _ => second.unwrap_or(1),
            };
            let word = ModMask::from_csi_param(modifier).wants_word();
            Outcome::Action(match fin {
                b'A' => KeyAction::ArrowUp,
                b'B' => KeyAction::ArrowDown,
                b'C' => KeyAction::ArrowRight { ctrl: word },
                b'D' => KeyAction::ArrowLeft { ctrl: word },
                b'H' => KeyAction::Home,
                _ => KeyAction::End,
            })
        }
        b'~' => {
            let mods = ModMask::from_csi_param(second.unwrap_or(1));
            match first {
                Some(3) => Outcome::Action(KeyAction::DeleteForward {
                    ctrl: mods.wants_word(),
                }),
                Some(1 | 7) => Outcome::Action(KeyAction::Home),
                Some(4 | 8) => Outcome::Action(KeyAction::End),
                Some(200) => Outcome::PasteStart,
                _ => Outcome::Unsupported,
            }
        }
        b'u' => match first {
            Some(13) => Outcome::Action(KeyAction::Return {
                shift: ModMask::from_csi_param(second.unwrap_or(1)).contains(ModMask::SHIFT),
            }),
            _ => Outcome::Unsupported,
        },
        _ => Outcome::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn action(bytes: &[u8]) -> Option<KeyAction> {
        match scan(bytes) {
            Scan::Complete {
                len,
                outcome: Outcome::Action(a),
            } => {
                assert_eq!(len, bytes.len(), "sequence must consume all bytes");
                Some(a)
            }
            _ => None,
        }
    }

    #[test]
    fn escape_table_is_bit_exact() {
        let right = KeyAction::ArrowRight { ctrl: false };
        let left = KeyAction::ArrowLeft { ctrl: false };
        let word_right = KeyAction::ArrowRight { ctrl: true };
        let word_left = KeyAction::ArrowLeft { ctrl: true };
        let table: &[(&[u8], KeyAction)] = &[
            (b"\x1b[C", right),
            (b"\x1b[D", left),
            (b"\x1b[1;5C", word_right.clone()),
            (b"\x1b[5C", word_right.clone()),
            (b"\x1b[1;5D", word_left.clone()),
            (b"\x1b[5D", word_left.clone()),
            (b"\x1b[H", KeyAction::Home),
            (b"\x1b[1~", KeyAction::Home),
            (b"\x1b[7~", KeyAction::Home),
            (b"\x1bOH", KeyAction::Home),
            (b"\x1b[1;5H", KeyAction::Home),
            (b"\x1b[F", KeyAction::End),
            (b"\x1b[4~", KeyAction::End),
            (b"\x1b[8~", KeyAction::End),
            (b"\x1bOF", KeyAction::End),
            (b"\x1b[1;5F", KeyAction::End),
            (b"\x1b[3~", KeyAction::DeleteForward { ctrl: false }),
            (b"\x1b[3;5~", KeyAction::DeleteForward { ctrl: true }),
            (b"\x1bf", word_right),
            (b"\x1bb", word_left),
        ];
        for (seq, expected) in table {
            assert_eq!(action(seq), Some(expected.clone()), "sequence {seq:?}");
        }
    }

    #[test]
    fn vertical_arrows_and_enter_variants() {
        assert_eq!(action(b"\x1b[A"), Some(KeyAction::ArrowUp));
        assert_eq!(action(b"\x1bOB"), Some(KeyAction::ArrowDown));
        assert_eq!(
            action(b"\x1b[13;2u"),
            Some(KeyAction::Return { shift: true })
        );
        assert_eq!(action(b"\x1b\r"), Some(KeyAction::Return { shift: true }));
    }

    #[test]
    fn alt_arrow_is_word_motion() {
        assert_eq!(
            action(b"\x1b[1;3D"),
            Some(KeyAction::ArrowLeft { ctrl: true })
        );
        assert_eq!(
            action(b"\x1b[1;2D"),
            Some(KeyAction::ArrowLeft { ctrl: false })
        );
    }

    #[test]
    fn prefixes_are_incomplete() {
        for prefix in [
            &b"\x1b"[..],
            b"\x1b[",
            b"\x1b[1",
            b"\x1b[1;",
            b"\x1b[1;5",
            b"\x1bO",
            b"\x1b[20",
        ] {
            assert_eq!(scan(prefix), Scan::Incomplete, "prefix {prefix:?}");
        }
    }

    #[test]
    fn unsupported_but_well_formed_sequences_are_consumed() {
        assert_eq!(
            scan(b"\x1b[2~"),
            Scan::Complete {
                len: 4,
                outcome: Outcome::Unsupported
            }
        );
        assert_eq!(
            scan(b"\x1b[201~rest"),
            Scan::Complete {
                len: 6,
                outcome: Outcome::Unsupported
            }
        );
        assert_eq!(
            scan(b"\x1bOP"),
            Scan::Complete {
                len: 3,
                outcome: Outcome::Unsupported
            }
        );
    }

    #[test]
    fn paste_start_marker() {
        assert_eq!(
            scan(b"\x1b[200~abc"),
            Scan::Complete {
                len: 6,
                outcome: Outcome::PasteStart
            }
        );
    }

    #[test]
    fn invalid_prefixes_report_drop_length() {
        // Alt+x: both bytes dropped.
        assert_eq!(scan(b"\x1bxyz"), Scan::Invalid { len: 2 });
        // ESC ESC: drop the first, the second starts a new scan.
        assert_eq!(scan(b"\x1b\x1b[C"), Scan::Invalid { len: 1 });
        // Control byte inside CSI params: drop ESC [ 1 and rescan the control byte.
        assert_eq!(scan(b"\x1b[1\x7f"), Scan::Invalid { len: 3 });
    }

    #[test]
    fn private_csi_is_swallowed_through_its_final_byte() {
        assert_eq!(
            scan(b"\x1b[?2004hX"),
            Scan::Complete {
                len: 8,
                outcome: Outcome::Unsupported
            }
        );
        assert_eq!(scan(b"\x1b[?20"), Scan::Incomplete);
        assert_eq!(scan(b"\x1b[?"), Scan::Incomplete);
        // A control byte before the final aborts it; the byte is rescanned.
        assert_eq!(scan(b"\x1b[?2\x03"), Scan::Invalid { len: 4 });
    }

    #[test]
    fn overflowing_params_fall_back_to_defaults() {
        assert_eq!(
            action(b"\x1b[1;99999999999C"),
            Some(KeyAction::ArrowRight { ctrl: false })
        );
    }
}
