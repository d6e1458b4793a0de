// # Log Buffer and Poller
//
// Captures formatted tracing events in a bounded in-memory buffer and drains
// them on a fixed interval for display.
//
// ## Components
//
// - [`LogBuffer`]: mutex-protected ring of [`LogEntry`]s with sequence numbers
// - [`LogBufferLayer`]: `tracing_subscriber` layer appending every event
// - [`LogPoller`]: timer-driven task forwarding new entries to a channel
//
// The lock is held only while appending or copying entries, never across I/O.
//
// ## Usage
//
// ```rust,ignore
// use tracing_subscriber::prelude::*;
//
// let buffer = LogBuffer::new(1000);
// tracing_subscriber::registry().with(buffer.layer()).init();
//
// let mut watch = LogPoller::new(buffer, Duration::from_secs(2)).spawn();
// while let Some(entry) = watch.next().await {
//     println!("{}", entry.line);
// }
// ```

use chrono::{SecondsFormat, Utc};
use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber, debug};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Default number of retained entries
pub const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One formatted log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Monotonically increasing, starting at 0
    pub sequence: u64,
    /// `<timestamp> - <LEVEL> - <target> - <message>`
    pub line: String,
}

#[derive(Debug)]
struct BufferInner {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_sequence: u64,
}

/// Bounded, append-only log buffer
///
/// When full, the oldest entry is evicted. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<BufferInner>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_BUFFER_CAPACITY)
    }
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(BufferInner {
                entries: VecDeque::with_capacity(capacity),
                capacity,
                next_sequence: 0,
            })),
        }
    }

    // A panic while holding the lock leaves the ring consistent, so recover.
    fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line and return its sequence number
    pub fn push(&self, line: impl Into<String>) -> u64 {
        let mut inner = self.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        if inner.entries.len() == inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(LogEntry {
            sequence,
            line: line.into(),
        });
        sequence
    }

    /// Copy retained entries with `sequence >= cursor`
    pub fn entries_since(&self, cursor: u64) -> Vec<LogEntry> {
        let inner = self.lock();
        inner
            .entries
            .iter()
            .filter(|entry| entry.sequence >= cursor)
            .cloned()
            .collect()
    }

    /// Copy every retained entry
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries_since(0)
    }

    /// Sequence number the next entry will get
    pub fn next_sequence(&self) -> u64 {
        self.lock().next_sequence
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// A tracing layer appending to this buffer
    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer {
            buffer: self.clone(),
        }
    }
}

/// Tracing layer that formats events into a [`LogBuffer`]
#[derive(Debug, Clone)]
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let line = format!(
            "{} - {} - {} - {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata.level(),
            metadata.target(),
            visitor.finish()
        );
        self.buffer.push(line);
    }
}

/// Collects the `message` field plus any extra `key=value` fields
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Fixed-interval drain of a [`LogBuffer`]
#[derive(Debug, Clone)]
pub struct LogPoller {
    buffer: LogBuffer,
    interval: Duration,
}

impl LogPoller {
    pub fn new(buffer: LogBuffer, interval: Duration) -> Self {
        Self { buffer, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forward entries to `sink` until `shutdown` fires or the sink closes
    ///
    /// Starts from the oldest retained entry. Entries evicted between two
    /// ticks are skipped.
    pub async fn run_with_shutdown(
        self,
        sink: mpsc::UnboundedSender<LogEntry>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cursor = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if sink.is_closed() {
                        debug!("Log consumer dropped, stopping poller");
                        return;
                    }

                    for entry in self.buffer.entries_since(cursor) {
                        cursor = entry.sequence + 1;
                        if sink.send(entry).is_err() {
                            debug!("Log consumer dropped, stopping poller");
                            return;
                        }
                    }
                }

                _ = &mut shutdown => {
                    debug!("Log poller shutdown signal received");
                    return;
                }
            }
        }
    }

    /// Spawn the poller on the current runtime
    pub fn spawn(self) -> LogWatch {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(self.run_with_shutdown(tx, stop_rx));

        LogWatch {
            entries: UnboundedReceiverStream::new(rx),
            stop: Some(stop_tx),
            handle,
        }
    }
}

/// Handle to a spawned [`LogPoller`]; yields entries as a [`Stream`]
///
/// Dropping the handle stops the poller at its next tick.
#[derive(Debug)]
pub struct LogWatch {
    entries: UnboundedReceiverStream<LogEntry>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl LogWatch {
    /// Signal shutdown and wait for the task to finish
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = self.handle.await;
    }
}

impl Stream for LogWatch {
    type Item = LogEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<LogEntry>> {
        Pin::new(&mut self.entries).poll_next(cx)
    }
}
