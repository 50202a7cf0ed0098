//! Progress events sent from a running crawl to its host
//!
//! The crawl only ever produces events; it never reads host state. Sends use
//! `try_send`, so a full or closed channel drops the event instead of stalling
//! the run.

use crate::state::RunStatus;
use tokio::sync::mpsc;

/// Default channel capacity used by the CLI
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Severity of a mirrored log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// An immutable notification about a run
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A user-facing log line
    Log { level: LogLevel, message: String },

    /// Short description of what the run is doing
    Status(String),

    /// Percentage of the page budget consumed, 0-100
    Progress(f32),

    /// The run reached a terminal status
    Done(RunStatus),
}

/// Creates a bounded event channel
pub fn event_channel(capacity: usize) -> (mpsc::Sender<CrawlEvent>, mpsc::Receiver<CrawlEvent>) {
    mpsc::channel(capacity.max(1))
}

/// Optional sending half held by the crawler
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    tx: Option<mpsc::Sender<CrawlEvent>>,
}

impl EventSink {
    pub(crate) fn new(tx: Option<mpsc::Sender<CrawlEvent>>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: CrawlEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone or lagging: nothing to do
            let _ = tx.try_send(event);
        }
    }

    /// Logs through tracing and mirrors the line onto the channel
    pub(crate) fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        self.emit(CrawlEvent::Log { level, message });
    }

    /// Delivers the terminal event, waiting for room if the channel is full
    pub(crate) async fn done(&self, status: RunStatus) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(CrawlEvent::Done(status)).await;
        }
    }

    pub(crate) fn status(&self, status: impl Into<String>) {
        self.emit(CrawlEvent::Status(status.into()));
    }

    pub(crate) fn progress(&self, pages_visited: u32, max_pages: u32) {
        let percent = if max_pages == 0 {
            100.0
        } else {
            (pages_visited.min(max_pages) as f32 / max_pages as f32) * 100.0
        };
        self.emit(CrawlEvent::Progress(percent));
    }
}
