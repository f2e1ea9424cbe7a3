//! Change descriptors
//!
//! A [`ChangeDescriptor`] is one step of a change list. Shapes are checked in
//! a fixed order and the first match wins:
//!
//! 1. `{"add": ...}` → [`ChangeDescriptor::AddFields`]
//! 2. `{"from": ..., "to": ...}` → [`ChangeDescriptor::ReplaceValue`]
//! 3. `{"removeSubfields": ...}` → [`ChangeDescriptor::RemoveSubfields`]
//!
//! Anything else is [`ChangeDescriptor::Unrecognized`] and applies as a no-op.
//! A recognized shape with a malformed body is a deserialization error.

use rlm_actions::{AddFieldsChange, RemoveSubfieldsChange, ReplaceValueChange};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One declarative mutation step
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeDescriptor {
    /// Add fields built from link data
    AddFields(AddFieldsChange),
    /// Write a formatted source-record value into the record
    ReplaceValue(ReplaceValueChange),
    /// Delete matching subfields
    RemoveSubfields(RemoveSubfieldsChange),
    /// No recognized shape; passes the record through
    Unrecognized(Value),
}

impl ChangeDescriptor {
    /// Classify a raw change payload
    ///
    /// # Errors
    /// Returns the serde error if a recognized shape has a malformed body
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let (is_add, is_replace, remove_body) = match &value {
            Value::Object(map) => (
                map.contains_key("add"),
                map.contains_key("from") && map.contains_key("to"),
                map.get("removeSubfields").cloned(),
            ),
            _ => return Ok(Self::Unrecognized(value)),
        };

        if is_add {
            return serde_json::from_value(value).map(Self::AddFields);
        }
        if is_replace {
            return serde_json::from_value(value).map(Self::ReplaceValue);
        }
        if let Some(body) = remove_body {
            return serde_json::from_value(body).map(Self::RemoveSubfields);
        }
        Ok(Self::Unrecognized(value))
    }

    /// Short name for logs and errors
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddFields(_) => "add",
            Self::ReplaceValue(_) => "replace",
            Self::RemoveSubfields(_) => "removeSubfields",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    /// Whether applying this step can change a record
    #[inline]
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl<'de> Deserialize<'de> for ChangeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}
