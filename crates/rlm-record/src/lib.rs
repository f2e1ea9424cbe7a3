//! RLM Record Model
//!
//! Ordered, structurally comparable bibliographic records.
//!
//! # Core Concepts
//!
//! - [`Record`]: Leader plus an ordered sequence of fields
//! - [`Field`]: Control field (tag + value) or data field (tag, indicators, subfields)
//! - [`Subfield`]: A `(code, value)` pair inside a data field
//!
//! Equality is structural and order-sensitive: two records are equal only if
//! every field, indicator, and subfield matches in the same position.
//!
//! # Example
//!
//! ```rust
//! use rlm_record::{Field, Record, Subfield};
//!
//! let mut record = Record::new();
//! record.insert_field(Field::control("001", "123"));
//! record.insert_field(Field::data("100", "1", " ", vec![Subfield::new("a", "Author")]));
//!
//! let snapshot = record.clone();
//! assert_eq!(snapshot, record);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod field;
mod record;

pub use error::RecordError;
pub use field::{Field, Subfield};
pub use record::Record;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
