//! Streaming ingest pipeline
//!
//! Reads a JSON array from any [`AsyncRead`], hands each element to its own
//! conversion task as soon as the element's last byte arrives, and reports
//! every outcome through an [`EventSink`].
//!
//! Dispatch is unbounded unless [`TransformConfig::max_in_flight`] is set, in
//! which case reading pauses until a conversion slot frees up. Either way the
//! `end` event is emitted only after every dispatched conversion has settled.
//!
//! Each element is depth-checked before it is parsed. An element nested past
//! [`TransformConfig::max_element_depth`] fails on its own without stopping
//! the batch.
//!
//! A malformed stream stops reading and emits `error` right away. Conversions
//! that were already dispatched still run to completion and emit their own
//! events, but no `end` event follows.

use crate::config::TransformConfig;
use crate::convert::RecordConverter;
use crate::emitter::{channel, BatchEvent, BatchEvents, EventSink};
use crate::engine::ChangeEngine;
use crate::error::{ConversionError, IngestError};
use crate::splitter::{ArraySplitter, RawElement};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

/// Counters for one ingest call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Elements handed to conversion
    pub dispatched: usize,
    /// Conversions that produced a result
    pub succeeded: usize,
    /// Conversions that failed
    pub failed: usize,
    /// Whether the input stream was malformed
    pub aborted: bool,
}

impl BatchSummary {
    /// Conversions that have settled either way
    #[inline]
    #[must_use]
    pub fn settled(&self) -> usize {
        self.succeeded + self.failed
    }

    fn settle(&mut self, outcome: Result<bool, JoinError>) {
        match outcome {
            Ok(true) => self.succeeded += 1,
            Ok(false) => self.failed += 1,
            Err(error) => {
                tracing::error!(error = %error, "conversion task did not complete");
                self.failed += 1;
            }
        }
    }
}

/// Batch transformer
///
/// Cheap to clone; clones share the converter.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: TransformConfig,
    converter: Arc<RecordConverter>,
}

impl Transformer {
    /// Create transformer with the default change engine
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        let converter = RecordConverter::new(ChangeEngine::default(), config.validation_options());
        Self {
            config,
            converter: Arc::new(converter),
        }
    }

    /// Replace the per-element converter
    #[inline]
    #[must_use]
    pub fn with_converter(mut self, converter: RecordConverter) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Start ingesting `reader` in the background and return its events
    ///
    /// Must be called from within a Tokio runtime.
    pub fn ingest<R>(&self, reader: R) -> BatchEvents
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (sink, events) = channel();
        let transformer = self.clone();
        tokio::spawn(async move {
            transformer.run(reader, sink).await;
        });
        events
    }

    /// Ingest `reader` to completion, reporting through `sink`
    ///
    /// Returns once every dispatched conversion has settled.
    pub async fn run<R, S>(&self, reader: R, sink: S) -> BatchSummary
    where
        R: AsyncRead + Unpin,
        S: EventSink,
    {
        let span = tracing::info_span!(
            "ingest",
            max_in_flight = ?self.config.max_in_flight,
            validate = self.config.validate,
        );
        self.run_inner(reader, Arc::new(sink)).instrument(span).await
    }

    async fn run_inner<R, S>(&self, mut reader: R, sink: Arc<S>) -> BatchSummary
    where
        R: AsyncRead + Unpin,
        S: EventSink,
    {
        let mut dispatcher = Dispatcher {
            converter: Arc::clone(&self.converter),
            sink,
            limiter: self
                .config
                .max_in_flight
                .map(|max| Arc::new(Semaphore::new(max.max(1)))),
            tasks: JoinSet::new(),
            summary: BatchSummary::default(),
        };

        let outcome = self.pump(&mut reader, &mut dispatcher).await;
        if let Err(error) = &outcome {
            tracing::error!(
                error = %error,
                dispatched = dispatcher.summary.dispatched,
                "ingest failed"
            );
        }

        let Dispatcher {
            sink,
            mut tasks,
            mut summary,
            ..
        } = dispatcher;

        match outcome {
            Err(error) => {
                summary.aborted = true;
                sink.emit(BatchEvent::Error(error));
                while let Some(settled) = tasks.join_next().await {
                    summary.settle(settled);
                }
            }
            Ok(()) => {
                while let Some(settled) = tasks.join_next().await {
                    summary.settle(settled);
                }
                tracing::info!(
                    dispatched = summary.dispatched,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "batch complete"
                );
                sink.emit(BatchEvent::End {
                    count: summary.dispatched,
                });
            }
        }
        summary
    }

    async fn pump<R, S>(
        &self,
        reader: &mut R,
        dispatcher: &mut Dispatcher<S>,
    ) -> Result<(), IngestError>
    where
        R: AsyncRead + Unpin,
        S: EventSink,
    {
        let mut splitter = ArraySplitter::new();
        let mut buffer = vec![0_u8; self.config.read_chunk_size.max(1)];

        loop {
            let read = reader.read(&mut buffer).await?;
            if read == 0 {
                return splitter.finish();
            }
            for element in splitter.feed(&buffer[..read])? {
                let limit = self.config.max_element_depth;
                if element.depth > limit {
                    tracing::debug!(
                        offset = element.offset,
                        depth = element.depth,
                        limit,
                        "element nests too deep"
                    );
                    dispatcher
                        .dispatch(Err(ConversionError::TooDeep {
                            depth: element.depth,
                            limit,
                        }))
                        .await;
                    continue;
                }
                dispatcher.dispatch(Ok(parse_element(&element)?)).await;
            }
        }
    }
}

/// Parse one split element
///
/// Nesting was already bounded by the splitter, so serde_json's own
/// recursion limit is lifted here.
fn parse_element(element: &RawElement) -> Result<Value, IngestError> {
    let syntax = |error: serde_json::Error| IngestError::syntax(element.offset, error.to_string());
    let mut deserializer = serde_json::Deserializer::from_slice(&element.bytes);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer).map_err(syntax)?;
    deserializer.end().map_err(syntax)?;
    Ok(value)
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

struct Dispatcher<S> {
    converter: Arc<RecordConverter>,
    sink: Arc<S>,
    limiter: Option<Arc<Semaphore>>,
    tasks: JoinSet<bool>,
    summary: BatchSummary,
}

impl<S: EventSink> Dispatcher<S> {
    /// Hand one element to its own task
    ///
    /// An element already rejected by the reader still takes an index and
    /// settles as a failure.
    async fn dispatch(&mut self, element: Result<Value, ConversionError>) {
        let permit = self.admit().await;
        let index = self.summary.dispatched;
        self.summary.dispatched += 1;

        let converter = Arc::clone(&self.converter);
        let sink = Arc::clone(&self.sink);
        let span = tracing::debug_span!("convert", index);
        self.tasks.spawn(
            async move {
                let _permit = permit;
                let outcome = match element {
                    Ok(value) => AssertUnwindSafe(converter.convert(value))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(ConversionError::Panicked(panic_message(&*panic)))
                        }),
                    Err(error) => Err(error),
                };
                match outcome {
                    Ok(result) => {
                        sink.emit(BatchEvent::Record { index, result });
                        true
                    }
                    Err(error) => {
                        tracing::warn!(index, error = %error, "conversion failed");
                        sink.emit(BatchEvent::Failed { index, error });
                        false
                    }
                }
            }
            .instrument(span),
        );

        while let Some(settled) = self.tasks.try_join_next() {
            self.summary.settle(settled);
        }
    }

    async fn admit(&mut self) -> Option<OwnedSemaphorePermit> {
        let limiter = Arc::clone(self.limiter.as_ref()?);
        if limiter.available_permits() == 0 {
            tracing::trace!(
                in_flight = self.tasks.len(),
                "waiting for conversion slot"
            );
        }
        // The semaphore is never closed, so acquiring only waits.
        limiter.acquire_owned().await.ok()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
