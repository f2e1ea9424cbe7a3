//! Change payloads consumed by the actions
//!
//! These are the bodies of the three change descriptor shapes. The wire
//! format is camelCase JSON.

use crate::predicate::ValuePredicate;
use rlm_record::{Record, Subfield};
use serde::{Deserialize, Serialize};

fn blank_indicator() -> String {
    " ".to_string()
}

fn default_format() -> String {
    crate::format::PLACEHOLDER.to_string()
}

fn collect_keyword() -> String {
    "collect".to_string()
}

/// Field template with `%s` placeholders in subfield values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub tag: String,
    #[serde(default = "blank_indicator")]
    pub ind1: String,
    #[serde(default = "blank_indicator")]
    pub ind2: String,
    #[serde(default)]
    pub subfields: Vec<Subfield>,
}

/// How unique link-data fields are merged into the record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Insert next to existing same-tag fields
    #[default]
    Add,
    /// Drop existing same-tag fields first
    Replace,
}

/// `{"add": ..., "order": [...], "duplicateFilterCodes": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFieldsChange {
    pub add: FieldTemplate,
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub duplicate_filter_codes: Vec<String>,
    #[serde(default)]
    pub mode: MergeMode,
}

/// Where a value is read from in the source record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocator {
    pub tag: String,
    /// `"value"` for the control-field value, otherwise a subfield code
    pub value: String,
}

impl SourceLocator {
    /// Extraction rule reading the control-field value
    pub const CONTROL_VALUE: &'static str = "value";

    /// Read the located value from `record`
    ///
    /// Returns `None` when the field or subfield is absent.
    #[must_use]
    pub fn extract<'a>(&'a self, record: &'a Record) -> Option<&'a str> {
        let mut fields = record.fields_by_tag(&self.tag);
        if self.value == Self::CONTROL_VALUE {
            fields.find_map(|f| f.value.as_deref())
        } else {
            fields.find_map(|f| f.subfield(&self.value))
        }
    }
}

/// Subfield code written in the destination field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCode {
    pub code: String,
}

/// Tag-level locator used inside a `where` rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagLocator {
    pub tag: String,
    #[serde(default = "collect_keyword")]
    pub value: String,
}

/// Collect sub-rule selecting which destination fields are written
///
/// The `collect` codes are gathered from the source field at `from.tag` and
/// from each destination field at `to.tag`; only destination fields whose
/// gathered subfields equal the source's are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereRule {
    pub collect: Vec<String>,
    pub from: TagLocator,
    pub to: TagLocator,
}

/// Destination of a replace step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationLocator {
    pub tag: String,
    pub value: ValueCode,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_rule: Option<WhereRule>,
}

/// `{"from": ..., "to": ..., "order": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceValueChange {
    pub from: SourceLocator,
    pub to: DestinationLocator,
    #[serde(default)]
    pub order: Vec<String>,
}

/// Body of `{"removeSubfields": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveSubfieldsChange {
    pub tag: String,
    pub code: String,
    pub value: ValuePredicate,
}

impl RemoveSubfieldsChange {
    /// Whether a subfield of a `tag` field is targeted
    #[inline]
    #[must_use]
    pub fn targets(&self, subfield: &Subfield) -> bool {
        subfield.code == self.code && self.value.matches(&subfield.value)
    }
}
