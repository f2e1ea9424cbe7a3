//! Subfield value predicates
//!
//! Wire form is a single string:
//! - `"*"` matches any value
//! - `"/pattern/"` is a regular expression
//! - anything else matches exactly

use crate::error::ActionError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Value-matching predicate for subfield removal
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValuePredicate {
    /// Matches every value
    Any,
    /// Matches one exact value
    Exact(String),
    /// Matches values the regex finds a match in
    Pattern(Regex),
}

impl ValuePredicate {
    /// Parse predicate keyword
    ///
    /// # Errors
    /// Returns `ActionError::InvalidPredicate` if a `/pattern/` fails to compile
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        if raw == "*" {
            return Ok(Self::Any);
        }
        if let Some(pattern) = raw
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            let regex = Regex::new(pattern).map_err(|source| ActionError::InvalidPredicate {
                pattern: pattern.to_string(),
                source,
            })?;
            return Ok(Self::Pattern(regex));
        }
        Ok(Self::Exact(raw.to_string()))
    }

    /// Check value against predicate
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == value,
            Self::Pattern(regex) => regex.is_match(value),
        }
    }
}

impl PartialEq for ValuePredicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any) => true,
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl TryFrom<String> for ValuePredicate {
    type Error = ActionError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ValuePredicate> for String {
    fn from(predicate: ValuePredicate) -> Self {
        match predicate {
            ValuePredicate::Any => "*".to_string(),
            ValuePredicate::Exact(value) => value,
            ValuePredicate::Pattern(regex) => format!("/{}/", regex.as_str()),
        }
    }
}
