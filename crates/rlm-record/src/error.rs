//! Error types for the record model

/// Errors while constructing or decoding records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Tag is not exactly three characters
    #[error("invalid tag: '{0}'")]
    InvalidTag(String),

    /// Subfield code is not exactly one character
    #[error("invalid subfield code '{code}' in field {tag}")]
    InvalidSubfieldCode { tag: String, code: String },

    /// Payload could not be decoded into a record
    #[error("record payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RecordError {
    /// Create invalid subfield code error
    pub fn invalid_subfield_code(tag: impl Into<String>, code: impl Into<String>) -> Self {
        Self::InvalidSubfieldCode {
            tag: tag.into(),
            code: code.into(),
        }
    }
}
