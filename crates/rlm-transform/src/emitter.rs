//! Batch result emitter
//!
//! Push-based event channel for one ingest call:
//! - [`BatchEvent::Record`] once per successfully converted element
//! - [`BatchEvent::Failed`] once per element whose conversion failed
//! - [`BatchEvent::End`] once, after every conversion has settled
//! - [`BatchEvent::Error`] at most once, when the input stream is malformed
//!
//! Record and failure events arrive in completion order, not input order.

use crate::decision::ConversionResult;
use crate::error::{ConversionError, IngestError};
use futures::Stream;
use serde_json::{json, Value};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One observable batch event
#[derive(Debug)]
pub enum BatchEvent {
    /// An element converted successfully
    Record {
        index: usize,
        result: ConversionResult,
    },
    /// An element failed to convert
    Failed {
        index: usize,
        error: ConversionError,
    },
    /// All dispatched conversions settled
    End { count: usize },
    /// The input stream was malformed; no further elements are read
    Error(IngestError),
}

impl BatchEvent {
    /// Event kind name
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record { .. } => "record",
            Self::Failed { .. } => "failed",
            Self::End { .. } => "end",
            Self::Error(_) => "error",
        }
    }

    /// Whether this event closes the batch
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. } | Self::Error(_))
    }

    /// JSON rendering for line-oriented consumers
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Record { index, result } => json!({
                "event": self.kind(),
                "index": index,
                "result": result,
            }),
            Self::Failed { index, error } => json!({
                "event": self.kind(),
                "index": index,
                "error": error.to_string(),
            }),
            Self::End { count } => json!({"event": self.kind(), "count": count}),
            Self::Error(error) => json!({"event": self.kind(), "error": error.to_string()}),
        }
    }
}

/// Receiver side of batch events
///
/// Implementations must not block; they are called from conversion tasks.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event
    fn emit(&self, event: BatchEvent);
}

impl EventSink for mpsc::UnboundedSender<BatchEvent> {
    fn emit(&self, event: BatchEvent) {
        if self.send(event).is_err() {
            tracing::trace!("batch event receiver dropped");
        }
    }
}

/// Create a connected sink and event stream
#[must_use]
pub fn channel() -> (mpsc::UnboundedSender<BatchEvent>, BatchEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, BatchEvents { rx })
}

/// Stream of events for one ingest call
///
/// Ends after the terminal event once every sender is dropped.
#[derive(Debug)]
pub struct BatchEvents {
    rx: mpsc::UnboundedReceiver<BatchEvent>,
}

impl BatchEvents {
    /// Wait for the next event
    pub async fn recv(&mut self) -> Option<BatchEvent> {
        self.rx.recv().await
    }

    /// Drain every event until the stream closes
    pub async fn collect_all(mut self) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for BatchEvents {
    type Item = BatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
