//! RLM Transform
//!
//! Streaming pipeline that applies declarative change lists to bibliographic
//! records.
//!
//! # Architecture
//!
//! ```text
//! bytes ─▶ ArraySplitter ─▶ element ─▶ RecordConverter ─▶ BatchEvent
//!                                      │
//!                                      ├─ snapshot
//!                                      ├─ ChangeEngine fold
//!                                      ├─ validate (optional)
//!                                      └─ decide
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rlm_transform::{BatchEvent, TransformConfig, Transformer};
//!
//! # async fn demo() {
//! let input = br#"[{"record": {"fields": []}, "changes": []}]"#;
//! let transformer = Transformer::new(TransformConfig::default());
//! for event in transformer.ingest(&input[..]).collect_all().await {
//!     if let BatchEvent::End { count } = event {
//!         assert_eq!(count, 1);
//!     }
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod convert;
pub mod decision;
pub mod descriptor;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod splitter;

pub use config::TransformConfig;
pub use convert::{InputElement, RecordConverter};
pub use decision::{decide, ConversionResult, NO_UPDATE_MESSAGE};
pub use descriptor::ChangeDescriptor;
pub use emitter::{BatchEvent, BatchEvents, EventSink};
pub use engine::{ChangeEngine, MutationContext};
pub use error::{ConversionError, IngestError};
pub use pipeline::{BatchSummary, Transformer};
pub use splitter::{ArraySplitter, RawElement};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
