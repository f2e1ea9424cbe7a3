//! Error types for record actions

/// Errors raised by field-manipulation actions
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A replace step needs a source record but none was supplied
    #[error("replace from {tag} requires a source record")]
    MissingSourceRecord { tag: String },

    /// Link data has a shape the converter cannot use
    #[error("invalid link data: {0}")]
    InvalidLinkData(String),

    /// Regex predicate failed to compile
    #[error("invalid predicate '{pattern}': {source}")]
    InvalidPredicate {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ActionError {
    /// Create missing source record error
    pub fn missing_source(tag: impl Into<String>) -> Self {
        Self::MissingSourceRecord { tag: tag.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_display() {
        let err = ActionError::missing_source("001");
        assert_eq!(err.to_string(), "replace from 001 requires a source record");
    }

    #[test]
    fn invalid_predicate_keeps_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ActionError::InvalidPredicate {
            pattern: "/(/".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid predicate '/(/'"));
    }
}
