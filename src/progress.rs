//! Run progress events and the publisher channel.
//!
//! Each run owns one ordered event channel. The pipeline stages hold cloned
//! [`ProgressPublisher`] handles and push events; a single consumer drains the
//! [`ProgressStream`] with a bounded wait, receiving keep-alive markers while
//! the pipeline is quiet. Producers never block: the channel is unbounded and
//! a closed consumer simply drops further events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Bounded wait used by consumers between keep-alive emissions.
pub const KEEP_ALIVE_WAIT: Duration = Duration::from_secs(1);

/// A progress event emitted by the pipeline.
///
/// Serializes as `{"type": "...", ...}` with snake_case payload fields, the
/// shape streamed to external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Scan heartbeat: number of messages scanned so far.
    Progress { scanned: u64 },

    /// The media phase is starting with this many items to process.
    MediaPhase { total_media: u64 },

    /// One media item settled (downloaded, skipped, or failed).
    MediaProgress {
        processed_count: u64,
        total_media: u64,
    },

    /// Terminal: the run finished.
    Complete { scanned: u64 },

    /// Terminal: the run aborted.
    Error { message: String },
}

impl ProgressEvent {
    /// Whether this event ends the run's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }
}

/// Create a progress channel for one run.
pub fn channel() -> (ProgressPublisher, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressPublisher {
            tx,
            terminal: Arc::new(AtomicBool::new(false)),
        },
        ProgressStream { rx },
    )
}

/// Producer handle, cloned into every pipeline stage.
///
/// At most one terminal event passes through per run; anything emitted after
/// the terminal is dropped.
#[derive(Clone)]
pub struct ProgressPublisher {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    terminal: Arc<AtomicBool>,
}

impl ProgressPublisher {
    pub fn progress(&self, scanned: u64) {
        self.emit(ProgressEvent::Progress { scanned });
    }

    pub fn media_phase(&self, total_media: u64) {
        self.emit(ProgressEvent::MediaPhase { total_media });
    }

    pub fn media_progress(&self, processed_count: u64, total_media: u64) {
        self.emit(ProgressEvent::MediaProgress {
            processed_count,
            total_media,
        });
    }

    pub fn complete(&self, scanned: u64) {
        self.emit(ProgressEvent::Complete { scanned });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::Error {
            message: message.into(),
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if event.is_terminal() {
            // First terminal wins; concurrent late terminals are dropped.
            if self.terminal.swap(true, Ordering::SeqCst) {
                return;
            }
        } else if self.terminal.load(Ordering::SeqCst) {
            return;
        }

        // A send error means the consumer went away; producers never block
        // or fail on that.
        let _ = self.tx.send(event);
    }
}

/// What a bounded-wait poll of the stream produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    /// An event arrived.
    Event(ProgressEvent),
    /// Nothing arrived within the wait; the consumer should keep the
    /// connection alive and poll again.
    KeepAlive,
    /// All publishers dropped and the buffer is drained.
    Closed,
}

/// Consumer side of the run's event channel.
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressStream {
    /// Wait up to `wait` for the next event.
    pub async fn next_event(&mut self, wait: Duration) -> Polled {
        match timeout(wait, self.rx.recv()).await {
            Ok(Some(event)) => Polled::Event(event),
            Ok(None) => Polled::Closed,
            Err(_) => Polled::KeepAlive,
        }
    }

    /// Pop a buffered event without waiting.
    pub fn try_next(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }
}
