//! Error types for the transform pipeline
//!
//! Two failure scopes:
//! - [`IngestError`]: the input stream is not a well-formed JSON array.
//!   Fatal to the batch, reported once.
//! - [`ConversionError`]: one element failed. Local to that element; siblings
//!   and end-of-batch accounting are unaffected.

use rlm_actions::ActionError;
use rlm_record::RecordError;

/// Stream-level failures
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Top-level value is not an array
    #[error("input is not a JSON array: found '{found}' at byte {offset}")]
    NotAnArray { offset: u64, found: char },

    /// Malformed JSON inside the array
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: u64, message: String },

    /// Input ended before the array was closed
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: u64 },

    /// Non-whitespace after the closing bracket
    #[error("trailing data after array at byte {offset}")]
    TrailingData { offset: u64 },

    /// Reading the input failed
    #[error("io error reading input: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Create syntax error at offset
    pub fn syntax(offset: u64, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}

/// Per-element failures
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Element does not have the `{record, changes, ...}` shape
    #[error("invalid batch element: {0}")]
    InvalidElement(#[source] serde_json::Error),

    /// Element nests deeper than the configured limit
    #[error("batch element nests {depth} levels deep (limit {limit})")]
    TooDeep { depth: usize, limit: usize },

    /// Record or source record payload is not a record
    #[error("record construction failed: {0}")]
    Record(#[from] RecordError),

    /// A change step failed
    #[error("change {position} ({kind}) failed: {source}")]
    Change {
        position: usize,
        kind: &'static str,
        #[source]
        source: ActionError,
    },

    /// Conversion task panicked
    #[error("conversion panicked: {0}")]
    Panicked(String),
}

impl ConversionError {
    /// Whether the element itself was malformed, as opposed to a step failing
    #[inline]
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidElement(_) | Self::TooDeep { .. } | Self::Record(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_array_display() {
        let err = IngestError::NotAnArray {
            offset: 0,
            found: '{',
        };
        assert_eq!(err.to_string(), "input is not a JSON array: found '{' at byte 0");
    }

    #[test]
    fn change_error_display() {
        let err = ConversionError::Change {
            position: 2,
            kind: "replace",
            source: ActionError::missing_source("001"),
        };
        assert!(err.to_string().starts_with("change 2 (replace) failed"));
        assert!(!err.is_malformed_input());
    }

    #[test]
    fn error_conversions() {
        let err: ConversionError = RecordError::InvalidTag("1".to_string()).into();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn too_deep_is_malformed_input() {
        let err = ConversionError::TooDeep {
            depth: 300,
            limit: 256,
        };
        assert!(err.is_malformed_input());
        assert_eq!(err.to_string(), "batch element nests 300 levels deep (limit 256)");
    }
}
