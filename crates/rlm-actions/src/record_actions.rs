//! Record-level field manipulation
//!
//! Provides the [`RecordActions`] trait used by the change engine, plus
//! [`DefaultRecordActions`].

use crate::change::{AddFieldsChange, MergeMode, RemoveSubfieldsChange, ReplaceValueChange};
use crate::error::ActionError;
use crate::format::apply_format;
use async_trait::async_trait;
use rlm_record::{Field, Record, Subfield};
use std::collections::HashSet;
use std::fmt::Debug;

/// Field-manipulation primitives applied by the change engine
///
/// Every operation takes the record by value and returns the next record,
/// so a change list folds through them one step at a time.
#[async_trait]
pub trait RecordActions: Send + Sync + Debug {
    /// Drop candidates already present on `record`
    ///
    /// Two fields are duplicates when they share a tag and the same values
    /// for `duplicate_filter_codes` (all subfields when the list is empty).
    /// Candidates are also deduplicated among themselves.
    async fn filter_existing_fields(
        &self,
        candidates: Vec<Field>,
        record: &Record,
        duplicate_filter_codes: &[String],
    ) -> Result<Vec<Field>, ActionError>;

    /// Merge unique fields into `record` per the change's merge mode
    async fn add_or_replace_fields(
        &self,
        record: Record,
        fields: Vec<Field>,
        change: &AddFieldsChange,
    ) -> Result<Record, ActionError>;

    /// Write a formatted source value into the destination fields
    ///
    /// # Errors
    /// Returns `ActionError::MissingSourceRecord` if `source` is `None`
    async fn replace_value_in_field(
        &self,
        source: Option<&Record>,
        record: Record,
        change: &ReplaceValueChange,
    ) -> Result<Record, ActionError>;

    /// Delete every subfield matched by the change
    async fn remove_subfields(
        &self,
        record: Record,
        change: &RemoveSubfieldsChange,
    ) -> Result<Record, ActionError>;
}

/// In-memory implementation of [`RecordActions`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRecordActions;

impl DefaultRecordActions {
    /// Create new actions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

type DuplicateKey = (String, Vec<Subfield>);

fn duplicate_key(field: &Field, codes: &[String]) -> DuplicateKey {
    let subfields = if codes.is_empty() {
        field.subfields.clone()
    } else {
        field.collect(codes).into_iter().cloned().collect()
    };
    (field.tag.clone(), subfields)
}

#[async_trait]
impl RecordActions for DefaultRecordActions {
    async fn filter_existing_fields(
        &self,
        candidates: Vec<Field>,
        record: &Record,
        duplicate_filter_codes: &[String],
    ) -> Result<Vec<Field>, ActionError> {
        let mut seen: HashSet<DuplicateKey> = {
            let candidate_tags: HashSet<&str> =
                candidates.iter().map(|f| f.tag.as_str()).collect();
            record
                .fields()
                .iter()
                .filter(|f| !f.is_control() && candidate_tags.contains(f.tag.as_str()))
                .map(|f| duplicate_key(f, duplicate_filter_codes))
                .collect()
        };

        let total = candidates.len();
        let unique: Vec<Field> = candidates
            .into_iter()
            .filter(|f| seen.insert(duplicate_key(f, duplicate_filter_codes)))
            .collect();

        tracing::debug!(
            candidates = total,
            unique = unique.len(),
            "filtered existing fields"
        );
        Ok(unique)
    }

    async fn add_or_replace_fields(
        &self,
        mut record: Record,
        fields: Vec<Field>,
        change: &AddFieldsChange,
    ) -> Result<Record, ActionError> {
        if fields.is_empty() {
            return Ok(record);
        }

        if change.mode == MergeMode::Replace {
            let tags: HashSet<String> = fields.iter().map(|f| f.tag.clone()).collect();
            for tag in &tags {
                record.remove_fields(tag);
            }
        }

        for mut field in fields {
            field.sort_subfields(&change.order);
            record.insert_field(field);
        }
        Ok(record)
    }

    async fn replace_value_in_field(
        &self,
        source: Option<&Record>,
        mut record: Record,
        change: &ReplaceValueChange,
    ) -> Result<Record, ActionError> {
        let source = source.ok_or_else(|| ActionError::missing_source(&change.from.tag))?;

        let Some(raw) = change.from.extract(source) else {
            tracing::debug!(tag = %change.from.tag, "source value absent, nothing to replace");
            return Ok(record);
        };
        let value = apply_format(&change.to.format, raw);

        let wanted = match &change.to.where_rule {
            None => None,
            Some(rule) => {
                let Some(field) = source.first_field(&rule.from.tag) else {
                    tracing::debug!(tag = %rule.from.tag, "collect source field absent");
                    return Ok(record);
                };
                let collected: Vec<Subfield> =
                    field.collect(&rule.collect).into_iter().cloned().collect();
                Some((rule, collected))
            }
        };

        let mut written = 0usize;
        for field in record.fields_mut(&change.to.tag) {
            if field.is_control() {
                continue;
            }
            if let Some((rule, collected)) = &wanted {
                let matches = field.tag == rule.to.tag
                    && field
                        .collect(&rule.collect)
                        .into_iter()
                        .eq(collected.iter());
                if !matches {
                    continue;
                }
            }
            field.set_subfield(&change.to.value.code, value.clone());
            field.sort_subfields(&change.order);
            written += 1;
        }

        tracing::debug!(tag = %change.to.tag, written, "replaced value");
        Ok(record)
    }

    async fn remove_subfields(
        &self,
        mut record: Record,
        change: &RemoveSubfieldsChange,
    ) -> Result<Record, ActionError> {
        let removed: usize = record
            .fields_mut(&change.tag)
            .map(|field| field.remove_subfields_where(|sf| change.targets(sf)))
            .sum();

        tracing::debug!(tag = %change.tag, code = %change.code, removed, "removed subfields");
        Ok(record)
    }
}
