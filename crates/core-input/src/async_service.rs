use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOP_CHANNEL, ASYNC_INPUT_STOP_EOF, ASYNC_INPUT_STOP_ERROR,
    ASYNC_INPUT_STOP_SIGNAL, CHANNEL_SEND_FAILURES, Event, INPUT_CHUNKS, InputEvent,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tracing::{Instrument, info, trace, warn};

const READ_CAPACITY: usize = 4_096;

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn the async input service reading raw bytes from stdin.
///
/// Chunks are forwarded untouched as `InputEvent::Bytes`; decoding happens on the
/// consumer side so the escape buffer stays owned by the editor. Terminal modes
/// (raw, bracketed paste) are the caller's business.
pub fn spawn_async_input(sender: Sender<Event>) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, listener) = ShutdownListener::new_pair();
    let span = tracing::debug_span!(target: "input.thread", "input_async_task");
    let handle = task::spawn(
        async move {
            AsyncByteReaderTask::new(sender, tokio::io::stdin(), listener)
                .run()
                .await;
        }
        .instrument(span),
    );

    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    Running,
    ShutdownSignal,
    ChannelClosed,
    EndOfInput,
    ReadError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Running => "running",
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::EndOfInput => "end_of_input",
            ExitReason::ReadError => "read_error",
        }
    }
}

struct AsyncByteReaderTask<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    reader: R,
    shutdown: ShutdownListener,
    exit_reason: ExitReason,
    read_error: Option<io::ErrorKind>,
}

impl<R> AsyncByteReaderTask<R>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, reader: R, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            reader,
            shutdown,
            exit_reason: ExitReason::Running,
            read_error: None,
        }
    }

    async fn run(mut self) -> ExitReason {
        info!(target: "input.thread", "async_input_task_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Ordering::Relaxed);
        let mut buf = vec![0u8; READ_CAPACITY];
        loop {
            let read = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    self.exit_reason = ExitReason::ShutdownSignal;
                    break;
                }
                result = self.reader.read(&mut buf) => result,
            };

            match read {
                Ok(0) => {
                    self.exit_reason = ExitReason::EndOfInput;
                    break;
                }
                Ok(n) => {
                    trace!(target: "input.thread", len = n, "chunk");
                    INPUT_CHUNKS.fetch_add(1, Ordering::Relaxed);
                    let event = Event::Input(InputEvent::Bytes(buf[..n].to_vec()));
                    if self.sender.send(event).await.is_err() {
                        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                        self.exit_reason = ExitReason::ChannelClosed;
                        break;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.exit_reason = ExitReason::ReadError;
                    self.read_error = Some(err.kind());
                    break;
                }
            }
        }

        match self.exit_reason {
            ExitReason::ShutdownSignal => {
                ASYNC_INPUT_STOP_SIGNAL.fetch_add(1, Ordering::Relaxed);
            }
            ExitReason::ChannelClosed => {
                ASYNC_INPUT_STOP_CHANNEL.fetch_add(1, Ordering::Relaxed);
            }
            ExitReason::EndOfInput => {
                ASYNC_INPUT_STOP_EOF.fetch_add(1, Ordering::Relaxed);
            }
            ExitReason::ReadError => {
                ASYNC_INPUT_STOP_ERROR.fetch_add(1, Ordering::Relaxed);
                warn!(target: "input.thread", error_kind = ?self.read_error, "async_input_task_read_error");
            }
            ExitReason::Running => {}
        }

        // The runtime also holds a sender, so a dropped sender alone would not
        // end its loop.
        if matches!(self.exit_reason, ExitReason::EndOfInput | ExitReason::ReadError)
            && self.sender.send(Event::Shutdown).await.is_err()
        {
            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        }

        info!(target: "input.thread", reason = self.exit_reason.as_str(), "async_input_task_stopped");
        self.exit_reason
    }
}
