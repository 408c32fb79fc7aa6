//! Promptline entrypoint: an interactive prompt with history and slash commands.
use anyhow::Result;
use clap::Parser;
use core_actions::{ActionObserver, EditorOptions, LineEditor};
use core_config::load_from;
use core_events::{
    ASYNC_INPUT_STOP_EOF, EVENT_CHANNEL_CAP, ESCAPES_DROPPED, EditorEffect, Event,
    EventSourceRegistry, InputEvent, KEYS_DECODED, KeyAction, PASTE_SESSIONS, SUBMISSIONS,
    TickEventSource,
};
use core_state::OverlaySelector;
use core_terminal::{CrosstermBackend, TerminalCapabilities, TerminalGuard};
use std::fmt;
use std::io::{Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;
mod render;

use commands::{CommandHost, Reply};
use render::InlineRenderer;

const LOG_FILE_NAME: &str = "promptline.log";
const RESIZE_POLL: Duration = Duration::from_millis(250);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "promptline", version, about = "Interactive prompt with history and slash commands")]
struct Args {
    /// Optional configuration file path (overrides discovery of `promptline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    editor: LineEditor,
    host: CommandHost,
    timeouts: IdleTimeouts,
    capabilities: TerminalCapabilities,
    terminal_guard: Option<TerminalGuard<'a>>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::default(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self) -> Result<RuntimeContext<'a>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let args = Args::parse();
        let config = load_from(args.config.clone())?;
        let capabilities = TerminalCapabilities::detect();

        let options = EditorOptions {
            command_prefix: config.command_prefix(),
            max_escape_len: config.max_escape_len(),
            max_paste_len: config.max_paste_bytes(),
            clear_on_submit: true,
        };
        let mut editor = LineEditor::new(options);
        editor.add_observer(Box::new(TraceObserver));
        let host = CommandHost::new(options.command_prefix, config.command_names().to_vec());

        self.backend = CrosstermBackend::new(config.bracketed_paste());
        let terminal_guard = if capabilities.wants_raw_mode() {
            Some(self.backend.enter_guard()?)
        } else {
            None
        };

        info!(
            target: "runtime.startup",
            config_override = args.config.is_some(),
            raw_mode = terminal_guard.is_some(),
            columns = capabilities.columns,
            commands = host.commands().len(),
            escape_timeout_ms = config.escape_timeout().as_millis() as u64,
            "bootstrap_complete"
        );

        Ok(RuntimeContext {
            editor,
            host,
            timeouts: IdleTimeouts {
                escape: config.escape_timeout(),
                paste: config.paste_timeout(),
            },
            capabilities,
            terminal_guard,
        })
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE_NAME);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Logs the kind of every applied action. Typed text is never logged.
struct TraceObserver;

impl ActionObserver for TraceObserver {
    fn on_action(&self, action: &KeyAction) {
        trace!(target: "actions.observer", kind = action.kind_label(), "action");
    }
}

/// Polls the terminal size and reports changes as `InputEvent::Resize`.
struct ResizeEventSource {
    interval: Duration,
    last: Option<(u16, u16)>,
}

impl ResizeEventSource {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: crossterm::terminal::size().ok(),
        }
    }
}

impl core_events::AsyncEventSource for ResizeEventSource {
    fn name(&self) -> &'static str {
        "resize"
    }
    fn spawn(self: Box<Self>, tx: mpsc::Sender<Event>) -> tokio::task::JoinHandle<()> {
        let ResizeEventSource { interval, mut last } = *self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Ok(size) = crossterm::terminal::size() else {
                    continue;
                };
                if last == Some(size) {
                    continue;
                }
                last = Some(size);
                if tx.send(Event::Input(InputEvent::Resize(size.0, size.1))).await.is_err() {
                    break;
                }
            }
        })
    }
}

enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    Interrupt,
    CommandExit,
    EndOfInput,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Interrupt => "interrupt",
            ShutdownReason::CommandExit => "command_exit",
            ShutdownReason::EndOfInput => "end_of_input",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

/// How long the decoder may sit on unfinished input before it is flushed.
#[derive(Debug, Clone, Copy)]
struct IdleTimeouts {
    escape: Duration,
    /// For a bracketed paste whose end marker has not arrived.
    paste: Duration,
}

struct PromptRuntime<'a, W: Write> {
    editor: LineEditor,
    host: CommandHost,
    renderer: InlineRenderer<W>,
    timeouts: IdleTimeouts,
    /// Input is cooked or piped: every `\n` ends a line and submits it.
    line_mode: bool,
    /// When the decoder last reported an unfinished escape or paste.
    pending_since: Option<Instant>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_task: Option<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
    _terminal_guard: Option<TerminalGuard<'a>>,
}

impl<'a> PromptRuntime<'a, Stdout> {
    fn new(
        context: RuntimeContext<'a>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        input_task: tokio::task::JoinHandle<()>,
        input_shutdown: core_input::AsyncInputShutdown,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        let RuntimeContext {
            editor,
            host,
            timeouts,
            capabilities,
            terminal_guard,
        } = context;
        let renderer = InlineRenderer::new(
            std::io::stdout(),
            capabilities.interactive_output,
            capabilities.columns,
        );
        let mut runtime = PromptRuntime::with_renderer(editor, host, renderer, timeouts, tx, rx);
        runtime.line_mode = terminal_guard.is_none();
        runtime.source_handles = source_handles;
        runtime.input_task = Some(input_task);
        runtime.input_shutdown = Some(input_shutdown);
        runtime._terminal_guard = terminal_guard;
        runtime
    }
}

impl<'a, W: Write> PromptRuntime<'a, W> {
    fn with_renderer(
        editor: LineEditor,
        host: CommandHost,
        renderer: InlineRenderer<W>,
        timeouts: IdleTimeouts,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
    ) -> Self {
        Self {
            editor,
            host,
            renderer,
            timeouts,
            line_mode: false,
            pending_since: None,
            rx,
            tx: Some(tx),
            source_handles: Vec::new(),
            input_task: None,
            input_shutdown: None,
            _terminal_guard: None,
        }
    }

    async fn run(&mut self) -> Result<ShutdownReason> {
        self.redraw();

        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            let control = match &event {
                Event::Input(InputEvent::Bytes(bytes)) => self.handle_bytes(bytes),
                Event::Input(InputEvent::Resize(w, h)) => self.handle_resize(*w, *h),
                Event::Tick => self.handle_tick(),
                Event::Shutdown => self.handle_shutdown(),
            };

            if let LoopControl::Break { reason } = control {
                shutdown_reason = reason;
                break;
            }
        }

        if let Err(e) = self.renderer.clear() {
            error!(target: "runtime.render", ?e, "prompt_clear_error");
        }
        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(shutdown_reason)
    }

    fn handle_bytes(&mut self, bytes: &[u8]) -> LoopControl {
        if self.line_mode {
            return self.handle_lines(bytes);
        }
        let mut effects: Vec<EditorEffect> = Vec::new();
        self.editor
            .feed(bytes, self.host.history(), self.host.commands(), &mut effects);
        self.pending_since = self.editor.has_pending().then(Instant::now);
        self.apply_effects(effects)
    }

    /// Cooked or piped input: a read holds whole lines, each ended by `\n`.
    /// Every line is submitted before the next one is fed.
    fn handle_lines(&mut self, bytes: &[u8]) -> LoopControl {
        for piece in bytes.split_inclusive(|&b| b == b'\n') {
            let mut effects: Vec<EditorEffect> = Vec::new();
            let line = piece.strip_suffix(b"\n");
            let text = line.map_or(piece, |l| l.strip_suffix(b"\r").unwrap_or(l));
            self.editor
                .feed(text, self.host.history(), self.host.commands(), &mut effects);
            if line.is_some() {
                self.editor.apply(
                    KeyAction::Return { shift: false },
                    self.host.history(),
                    self.host.commands(),
                    &mut effects,
                );
            }
            if let LoopControl::Break { reason } = self.apply_effects(effects) {
                return LoopControl::Break { reason };
            }
        }
        self.pending_since = self.editor.has_pending().then(Instant::now);
        LoopControl::Continue
    }

    fn handle_tick(&mut self) -> LoopControl {
        let Some(since) = self.pending_since else {
            return LoopControl::Continue;
        };
        let limit = if self.editor.in_paste() {
            self.timeouts.paste
        } else {
            self.timeouts.escape
        };
        if since.elapsed() < limit {
            return LoopControl::Continue;
        }
        self.pending_since = None;
        let mut effects: Vec<EditorEffect> = Vec::new();
        if self
            .editor
            .flush_pending(self.host.history(), self.host.commands(), &mut effects)
        {
            trace!(target: "runtime", "pending_input_flushed");
        }
        self.apply_effects(effects)
    }

    fn handle_resize(&mut self, width: u16, height: u16) -> LoopControl {
        trace!(target: "runtime", width, height, "resize");
        self.renderer.set_columns(width);
        self.redraw();
        LoopControl::Continue
    }

    fn handle_shutdown(&mut self) -> LoopControl {
        // Input ended: a trailing lone ESC still counts.
        if self.editor.has_pending() {
            let mut effects: Vec<EditorEffect> = Vec::new();
            self.editor
                .flush_pending(self.host.history(), self.host.commands(), &mut effects);
            if let LoopControl::Break { reason } = self.apply_effects(effects) {
                return LoopControl::Break { reason };
            }
        }
        LoopControl::Break {
            reason: ShutdownReason::EndOfInput,
        }
    }

    fn apply_effects(&mut self, effects: Vec<EditorEffect>) -> LoopControl {
        for effect in effects {
            match effect {
                EditorEffect::Change(_) => {}
                EditorEffect::Submit(text) => match self.host.handle_submit(&text) {
                    Reply::Silent => {}
                    Reply::Lines(lines) => {
                        if let Err(e) = self.renderer.print_lines(&lines) {
                            error!(target: "runtime.render", ?e, "output_error");
                        }
                    }
                    Reply::Exit => {
                        info!(target: "runtime", "exit_command");
                        return LoopControl::Break {
                            reason: ShutdownReason::CommandExit,
                        };
                    }
                },
                EditorEffect::Interrupt => {
                    info!(target: "runtime", "interrupt");
                    return LoopControl::Break {
                        reason: ShutdownReason::Interrupt,
                    };
                }
            }
        }
        // Cursor moves produce no effect but still need a repaint.
        self.redraw();
        LoopControl::Continue
    }

    fn redraw(&mut self) {
        let overlay = OverlaySelector::new(self.host.prefix(), self.host.commands());
        if let Err(e) = self.renderer.draw(self.editor.state(), &overlay) {
            error!(target: "runtime.render", ?e, "prompt_draw_error");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "dropping_runtime_sender"
            );
            drop(tx);
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "input_task_shutdown_signal"
            );
            shutdown.signal();
        }

        if let Some(handle) = self.input_task.take() {
            match handle.await {
                Ok(_) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_joined"
                ),
                Err(err) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_cancelled"
                ),
                Err(err) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "input_task_join_failed"
                ),
            }
        }

        info!(
            target: "runtime.shutdown",
            keys = KEYS_DECODED.load(Ordering::Relaxed),
            submissions = SUBMISSIONS.load(Ordering::Relaxed),
            pastes = PASTE_SESSIONS.load(Ordering::Relaxed),
            escapes_dropped = ESCAPES_DROPPED.load(Ordering::Relaxed),
            input_eof = ASYNC_INPUT_STOP_EOF.load(Ordering::Relaxed),
            history_len = self.host.history().len(),
            "session_counters"
        );
        log_shutdown_stage(reason, "complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let context = startup.run()?;
    let escape_timeout = context.timeouts.escape;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let mut registry = EventSourceRegistry::new();
    // Ticks at the escape timeout bound how long a lone ESC waits: at most twice the timeout.
    registry.register(TickEventSource::new(escape_timeout));
    if context.capabilities.interactive_output {
        registry.register(ResizeEventSource::new(RESIZE_POLL));
    }
    let source_handles = registry.spawn_all(&tx);

    let mut runtime =
        PromptRuntime::new(context, tx, rx, input_task, input_shutdown, source_handles);
    runtime.run().await?;
    Ok(())
}
