//! Fields and subfields
//!
//! A [`Field`] is either a control field (`tag` + `value`) or a data field
//! (`tag`, indicators, ordered [`Subfield`]s).

use crate::error::RecordError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A `(code, value)` pair inside a data field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subfield {
    /// Single-character subfield code
    pub code: String,
    /// Subfield content
    pub value: String,
}

impl Subfield {
    /// Create new subfield
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// One field of a record
///
/// Control fields carry `value` and never subfields. Data fields carry
/// indicators and subfields and never `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Field {
    /// Three-character field tag
    pub tag: String,
    /// First indicator (data fields only)
    #[serde(default)]
    pub ind1: Option<String>,
    /// Second indicator (data fields only)
    #[serde(default)]
    pub ind2: Option<String>,
    /// Control field value
    #[serde(default)]
    pub value: Option<String>,
    /// Ordered subfields (data fields only)
    #[serde(default)]
    pub subfields: Vec<Subfield>,
}

impl Field {
    /// Create control field
    #[inline]
    #[must_use]
    pub fn control(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ind1: None,
            ind2: None,
            value: Some(value.into()),
            subfields: Vec::new(),
        }
    }

    /// Create data field
    #[inline]
    #[must_use]
    pub fn data(
        tag: impl Into<String>,
        ind1: impl Into<String>,
        ind2: impl Into<String>,
        subfields: Vec<Subfield>,
    ) -> Self {
        Self {
            tag: tag.into(),
            ind1: Some(ind1.into()),
            ind2: Some(ind2.into()),
            value: None,
            subfields,
        }
    }

    /// Whether this is a control field
    #[inline]
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.value.is_some()
    }

    /// First value for subfield code
    #[must_use]
    pub fn subfield(&self, code: &str) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// All values for subfield code, in field order
    pub fn subfield_values<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Set subfield value
    ///
    /// Replaces the first subfield with `code` and drops any later ones.
    /// Appends a new subfield if none exists.
    pub fn set_subfield(&mut self, code: &str, value: impl Into<String>) {
        let value = value.into();
        match self.subfields.iter().position(|sf| sf.code == code) {
            Some(first) => {
                self.subfields[first].value = value;
                let mut idx = 0;
                self.subfields.retain(|sf| {
                    let keep = idx <= first || sf.code != code;
                    idx += 1;
                    keep
                });
            }
            None => self.subfields.push(Subfield::new(code, value)),
        }
    }

    /// Remove subfields matching predicate
    ///
    /// # Returns
    /// Number of subfields removed
    pub fn remove_subfields_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Subfield) -> bool,
    {
        let before = self.subfields.len();
        self.subfields.retain(|sf| !predicate(sf));
        before - self.subfields.len()
    }

    /// Sort subfields by code order
    ///
    /// Stable: codes missing from `order` keep their relative order after
    /// the listed ones. An empty `order` leaves the field untouched.
    pub fn sort_subfields<S: AsRef<str>>(&mut self, order: &[S]) {
        if order.is_empty() {
            return;
        }
        let rank = |sf: &Subfield| {
            order
                .iter()
                .position(|code| code.as_ref() == sf.code)
                .unwrap_or(order.len())
        };
        self.subfields.sort_by_key(rank);
    }

    /// Gather subfields whose code appears in `codes`
    ///
    /// Result is grouped in `codes` order; within one code, field order is kept.
    #[must_use]
    pub fn collect<S: AsRef<str>>(&self, codes: &[S]) -> Vec<&Subfield> {
        codes
            .iter()
            .flat_map(|code| {
                self.subfields
                    .iter()
                    .filter(move |sf| sf.code == code.as_ref())
            })
            .collect()
    }

    /// Check tag and subfield code shape
    ///
    /// # Errors
    /// - `RecordError::InvalidTag` if tag is not three characters
    /// - `RecordError::InvalidSubfieldCode` if a code is not one character
    pub fn check_shape(&self) -> Result<(), RecordError> {
        if self.tag.chars().count() != 3 {
            return Err(RecordError::InvalidTag(self.tag.clone()));
        }
        if let Some(sf) = self.subfields.iter().find(|sf| sf.code.chars().count() != 1) {
            return Err(RecordError::invalid_subfield_code(&self.tag, &sf.code));
        }
        Ok(())
    }
}

// Data fields always serialize `subfields`, even when empty, so an emptied
// field stays recognizable as a data field downstream.
impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(value) = &self.value {
            let mut state = serializer.serialize_struct("Field", 2)?;
            state.serialize_field("tag", &self.tag)?;
            state.serialize_field("value", value)?;
            return state.end();
        }

        let mut state = serializer.serialize_struct("Field", 4)?;
        state.serialize_field("tag", &self.tag)?;
        state.serialize_field("ind1", self.ind1.as_deref().unwrap_or(" "))?;
        state.serialize_field("ind2", self.ind2.as_deref().unwrap_or(" "))?;
        state.serialize_field("subfields", &self.subfields)?;
        state.end()
    }
}
