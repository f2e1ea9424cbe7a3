//! RLM Record Actions
//!
//! The field-manipulation collaborators the change engine delegates to.
//!
//! # Core Operations
//!
//! - **Link data conversion**: [`LinkDataActions`] fills an add template from link data
//! - **Existing-field filter**: drops candidates already on the record
//! - **Add or replace**: merges unique fields into the record
//! - **Value replacement**: formats a source-record value into destination fields
//! - **Subfield removal**: deletes subfields matching a [`ValuePredicate`]
//! - **Validation**: [`RecordValidator`] checks and fixes the final record
//!
//! All record operations are async and take the record by value, so they
//! can be swapped for implementations backed by external services.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod change;
pub mod error;
pub mod format;
pub mod link_data;
pub mod predicate;
pub mod record_actions;
pub mod validate;

pub use change::{
    AddFieldsChange, DestinationLocator, FieldTemplate, MergeMode, RemoveSubfieldsChange,
    ReplaceValueChange, SourceLocator, TagLocator, ValueCode, WhereRule,
};
pub use error::ActionError;
pub use link_data::{DefaultLinkDataActions, LinkDataActions};
pub use predicate::ValuePredicate;
pub use record_actions::{DefaultRecordActions, RecordActions};
pub use validate::{DefaultValidator, RecordValidator, ValidationOptions, ValidationReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
