//! Change application engine
//!
//! Folds a change list left-to-right over a target record. Each step sees the
//! record produced by the previous one; the source record and link data stay
//! fixed for the whole fold.

use crate::descriptor::ChangeDescriptor;
use crate::error::ConversionError;
use rlm_actions::{
    ActionError, DefaultLinkDataActions, DefaultRecordActions, LinkDataActions, RecordActions,
};
use rlm_record::Record;
use serde_json::Value;
use std::sync::Arc;

/// Inputs of one fold
///
/// Only `record` is mutated; everything else is borrowed read-only.
#[derive(Debug)]
pub struct MutationContext<'a> {
    /// Record being updated
    pub record: Record,
    /// Record supplying values for replace steps
    pub source: Option<&'a Record>,
    /// Payload supplying values for add steps
    pub link_data: Option<&'a Value>,
    /// Steps to apply, in order
    pub changes: &'a [ChangeDescriptor],
}

impl<'a> MutationContext<'a> {
    /// Create context with no source record or link data
    #[inline]
    #[must_use]
    pub fn new(record: Record, changes: &'a [ChangeDescriptor]) -> Self {
        Self {
            record,
            source: None,
            link_data: None,
            changes,
        }
    }

    /// With source record
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: &'a Record) -> Self {
        self.source = Some(source);
        self
    }

    /// With link data
    #[inline]
    #[must_use]
    pub fn with_link_data(mut self, link_data: &'a Value) -> Self {
        self.link_data = Some(link_data);
        self
    }
}

/// Applies change lists through pluggable record actions
#[derive(Debug, Clone)]
pub struct ChangeEngine {
    record_actions: Arc<dyn RecordActions>,
    link_data_actions: Arc<dyn LinkDataActions>,
}

impl ChangeEngine {
    /// Create engine over the given actions
    #[inline]
    #[must_use]
    pub fn new(
        record_actions: Arc<dyn RecordActions>,
        link_data_actions: Arc<dyn LinkDataActions>,
    ) -> Self {
        Self {
            record_actions,
            link_data_actions,
        }
    }

    /// Apply every change in order and return the final record
    ///
    /// An empty change list returns the record unchanged. Unrecognized
    /// descriptors pass the record through.
    ///
    /// # Errors
    /// Returns `ConversionError::Change` for the first step that fails;
    /// later steps are not applied.
    pub async fn apply(&self, context: MutationContext<'_>) -> Result<Record, ConversionError> {
        let MutationContext {
            mut record,
            source,
            link_data,
            changes,
        } = context;

        for (position, change) in changes.iter().enumerate() {
            tracing::debug!(
                position,
                kind = change.kind(),
                remaining = changes.len() - position - 1,
                "applying change"
            );
            record = self
                .apply_one(record, change, source, link_data)
                .await
                .map_err(|error| ConversionError::Change {
                    position,
                    kind: change.kind(),
                    source: error,
                })?;
        }

        tracing::debug!(applied = changes.len(), "changes done");
        Ok(record)
    }

    async fn apply_one(
        &self,
        record: Record,
        change: &ChangeDescriptor,
        source: Option<&Record>,
        link_data: Option<&Value>,
    ) -> Result<Record, ActionError> {
        match change {
            ChangeDescriptor::AddFields(add) => {
                let candidates = self
                    .link_data_actions
                    .convert_link_data_to_fields(link_data, add)
                    .await?;
                let unique = self
                    .record_actions
                    .filter_existing_fields(candidates, &record, &add.duplicate_filter_codes)
                    .await?;
                self.record_actions
                    .add_or_replace_fields(record, unique, add)
                    .await
            }
            ChangeDescriptor::ReplaceValue(replace) => {
                self.record_actions
                    .replace_value_in_field(source, record, replace)
                    .await
            }
            ChangeDescriptor::RemoveSubfields(remove) => {
                self.record_actions.remove_subfields(record, remove).await
            }
            ChangeDescriptor::Unrecognized(_) => Ok(record),
        }
    }
}

impl Default for ChangeEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(DefaultRecordActions::new()),
            Arc::new(DefaultLinkDataActions::new()),
        )
    }
}
