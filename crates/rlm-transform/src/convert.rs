//! Per-element record conversion
//!
//! One batch element goes through: record construction → snapshot → change
//! fold → optional validation pass → update decision.
//!
//! The decision compares against the snapshot after any fix-ups, so a record
//! repaired by the validator is reported as updated.

use crate::decision::{decide, ConversionResult};
use crate::descriptor::ChangeDescriptor;
use crate::engine::{ChangeEngine, MutationContext};
use crate::error::ConversionError;
use rlm_actions::{DefaultValidator, RecordValidator, ValidationOptions};
use rlm_record::Record;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// One element of the input array
///
/// `{record, changes?, sourceRecord?, linkData?}`; `hostRecord` is accepted
/// as an alias of `sourceRecord`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputElement {
    /// Record to update
    pub record: Value,
    /// Ordered change list (`null` or absent means none)
    #[serde(default)]
    pub changes: Option<Vec<ChangeDescriptor>>,
    /// Record supplying values for replace steps
    #[serde(default, alias = "hostRecord")]
    pub source_record: Option<Value>,
    /// Payload supplying values for add steps
    #[serde(default)]
    pub link_data: Option<Value>,
}

impl InputElement {
    /// Decode element from parsed JSON
    ///
    /// # Errors
    /// Returns `ConversionError::InvalidElement` if the shape is wrong or a
    /// recognized change has a malformed body
    pub fn from_value(value: Value) -> Result<Self, ConversionError> {
        serde_json::from_value(value).map_err(ConversionError::InvalidElement)
    }
}

/// Converts batch elements into conversion results
#[derive(Debug, Clone)]
pub struct RecordConverter {
    engine: ChangeEngine,
    validator: Arc<dyn RecordValidator>,
    options: ValidationOptions,
}

impl RecordConverter {
    /// Create converter with the structural validator
    #[inline]
    #[must_use]
    pub fn new(engine: ChangeEngine, options: ValidationOptions) -> Self {
        Self {
            engine,
            validator: Arc::new(DefaultValidator),
            options,
        }
    }

    /// Replace the validation pass
    #[inline]
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn RecordValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Convert one parsed array element
    ///
    /// # Errors
    /// - `ConversionError::InvalidElement` if the element shape is wrong
    /// - `ConversionError::Record` if a record payload cannot be constructed
    /// - `ConversionError::Change` if a change step fails
    pub async fn convert(&self, value: Value) -> Result<ConversionResult, ConversionError> {
        let element = InputElement::from_value(value)?;

        let record = Record::from_value(element.record)?;
        let source = element.source_record.map(Record::from_value).transpose()?;
        let changes = element.changes.unwrap_or_default();
        let link_data = element.link_data.filter(|v| !v.is_null());

        tracing::debug!(
            fields = record.len(),
            changes = changes.len(),
            has_source = source.is_some(),
            has_link_data = link_data.is_some(),
            "updating record"
        );

        let snapshot = record.clone();
        let context = MutationContext {
            record,
            source: source.as_ref(),
            link_data: link_data.as_ref(),
            changes: &changes,
        };
        let final_record = self.engine.apply(context).await?;

        if !self.options.enabled() {
            let result = decide(&snapshot, final_record);
            tracing::debug!(updated = result.updated, "record update decided");
            return Ok(result);
        }

        let report = self.validator.validate(final_record, self.options);
        let mut result = decide(&snapshot, report.record);
        tracing::debug!(
            updated = result.updated,
            failed = report.failed,
            "record update decided"
        );
        result.failed = report.failed;
        result.messages.extend(report.messages);
        Ok(result)
    }
}

impl Default for RecordConverter {
    fn default() -> Self {
        Self::new(ChangeEngine::default(), ValidationOptions::default())
    }
}
