//! Core event types and channel helpers for promptline.
//!
//! Two layers of events live here:
//! * `Event` / `InputEvent`: what flows through the runtime channel (raw byte
//!   chunks from the terminal, ticks, shutdown).
//! * `KeyAction`: the decoded, terminal-independent editing action produced by
//!   `core-input` and consumed by the `core-actions` dispatcher. The enum is
//!   exhaustive so the dispatcher must account for every key category.

use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Single producer (stdin reader task) and single consumer (editor loop). The reader awaits `send`
// when the channel is full so no keystroke bytes are ever dropped; a dropped byte inside an escape
// sequence would turn into garbage text.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters. Inspected by tests and logged once on shutdown.
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static INPUT_CHUNKS: AtomicU64 = AtomicU64::new(0); // raw chunks read from stdin
pub static KEYS_DECODED: AtomicU64 = AtomicU64::new(0); // KeyActions emitted by decoders
pub static ESCAPES_DROPPED: AtomicU64 = AtomicU64::new(0); // malformed / unsupported sequences
pub static PASTE_SESSIONS: AtomicU64 = AtomicU64::new(0); // bracketed paste starts
pub static PASTE_BYTES: AtomicU64 = AtomicU64::new(0); // total bytes across all pastes
pub static SUBMISSIONS: AtomicU64 = AtomicU64::new(0); // accepted Return presses
// Async input task lifecycle telemetry
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_SIGNAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_CHANNEL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_EOF: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_ERROR: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    /// Periodic monotonic tick used to flush an idle pending escape sequence.
    Tick,
    Shutdown,
}

/// Events produced by the input task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// One raw read from the terminal. Boundaries are arbitrary: an escape
    /// sequence or a multi-byte character may be split across chunks.
    Bytes(Vec<u8>),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------
/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
///
/// Each source must stop when `tx.send(..).await` returns Err (channel closed).
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used for logging.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// `Sender` clone; the caller must drop its final clone during shutdown so sources observe
    /// the closed channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        // Drain so a second call cannot spawn duplicates.
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in monotonic tick source. Emits `Event::Tick` every configured interval.
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Logical key actions
// -------------------------------------------------------------------------------------------------

bitflags::bitflags! {
    /// Modifier state carried by a CSI sequence.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 { const SHIFT=1; const ALT=2; const CTRL=4; const META=8; }
}

impl ModMask {
    /// Decode an xterm-style modifier parameter (`1 + bitmask`).
    ///
    /// `2` = Shift, `3` = Alt, `5` = Ctrl. `0` and `1` both mean "no modifier".
    pub fn from_csi_param(param: u32) -> Self {
        let bits = param.saturating_sub(1);
        ModMask::from_bits_truncate(u8::try_from(bits & 0x0f).unwrap_or(0))
    }

    /// Word-wise motion is requested by Ctrl (and by Alt, the macOS convention).
    pub fn wants_word(self) -> bool {
        self.intersects(ModMask::CTRL | ModMask::ALT)
    }
}

/// A decoded, terminal-independent editing action.
///
/// Escape sequences that fail to decode never become a `KeyAction`; the decoder
/// drops them internally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Text to insert. Multi-char payloads (pastes) have CR/LF runs collapsed to a space.
    Char(String),
    Return { shift: bool },
    ArrowUp,
    ArrowDown,
    ArrowLeft { ctrl: bool },
    ArrowRight { ctrl: bool },
    Home,
    End,
    DeleteForward { ctrl: bool },
    DeleteBackward { ctrl: bool },
    KillToLineEnd,
    /// Bare ESC resolved by the caller's idle flush.
    Cancel,
    /// Ctrl+C.
    Interrupt,
}

impl KeyAction {
    /// Discriminant label for logging. Never includes the `Char` payload.
    pub fn kind_label(&self) -> &'static str {
        match self {
            KeyAction::Char(_) => "char",
            KeyAction::Return { shift: true } => "return_shift",
            KeyAction::Return { shift: false } => "return",
            KeyAction::ArrowUp => "up",
            KeyAction::ArrowDown => "down",
            KeyAction::ArrowLeft { ctrl: true } => "word_left",
            KeyAction::ArrowLeft { ctrl: false } => "left",
            KeyAction::ArrowRight { ctrl: true } => "word_right",
            KeyAction::ArrowRight { ctrl: false } => "right",
            KeyAction::Home => "home",
            KeyAction::End => "end",
            KeyAction::DeleteForward { ctrl: true } => "delete_word_forward",
            KeyAction::DeleteForward { ctrl: false } => "delete_forward",
            KeyAction::DeleteBackward { ctrl: true } => "delete_word_backward",
            KeyAction::DeleteBackward { ctrl: false } => "delete_backward",
            KeyAction::KillToLineEnd => "kill_to_line_end",
            KeyAction::Cancel => "cancel",
            KeyAction::Interrupt => "interrupt",
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Char(s) => write!(f, "char(len={})", s.chars().count()),
            other => f.write_str(other.kind_label()),
        }
    }
}

/// Side effects the editor reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    /// The buffer text changed (insert, delete, history load, newline, clear).
    Change(String),
    /// Return was accepted; payload is the raw text or `prefix + command`.
    Submit(String),
    /// Ctrl+C reached the editor; the caller decides what it means.
    Interrupt,
}

/// Effects from a single dispatch. Most actions produce zero or one effect.
pub type EffectList = SmallVec<[EditorEffect; 2]>;
