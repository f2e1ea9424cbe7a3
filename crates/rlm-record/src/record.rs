//! Bibliographic record
//!
//! Provides [`Record`], an ordered collection of [`Field`]s with a leader.

use crate::error::RecordError;
use crate::field::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered bibliographic record
///
/// # Invariants
/// - Field order is significant and preserved across (de)serialization
/// - Equality is structural: same leader, same fields in the same order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// 24-character record leader (may be empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leader: String,
    /// Ordered fields
    #[serde(default)]
    fields: Vec<Field>,
}

impl Record {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create record from fields, keeping their order
    #[inline]
    #[must_use]
    pub fn with_fields(leader: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            leader: leader.into(),
            fields,
        }
    }

    /// Construct record from JSON payload
    ///
    /// # Errors
    /// Returns `RecordError::Decode` if the payload is not a record
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Convert record to JSON payload
    ///
    /// # Errors
    /// Returns `RecordError::Decode` if serialization fails
    pub fn to_value(&self) -> Result<Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }

    /// All fields in order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields with `tag`, in record order
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// Mutable fields with `tag`, in record order
    pub fn fields_mut<'a>(&'a mut self, tag: &'a str) -> impl Iterator<Item = &'a mut Field> + 'a {
        self.fields.iter_mut().filter(move |f| f.tag == tag)
    }

    /// Mutable access to every field
    pub fn all_fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// First field with `tag`
    #[must_use]
    pub fn first_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Insert field at its tag-ordered position
    ///
    /// The field lands after every existing field whose tag sorts at or
    /// before its own, so same-tag fields keep insertion order.
    pub fn insert_field(&mut self, field: Field) {
        let idx = self
            .fields
            .iter()
            .position(|f| f.tag > field.tag)
            .unwrap_or(self.fields.len());
        self.fields.insert(idx, field);
    }

    /// Remove all fields with `tag`
    ///
    /// # Returns
    /// Number of fields removed
    pub fn remove_fields(&mut self, tag: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| f.tag != tag);
        before - self.fields.len()
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
