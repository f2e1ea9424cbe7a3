//! Transformer configuration

use rlm_actions::ValidationOptions;
use serde::{Deserialize, Serialize};

/// Default number of bytes read from the input per poll
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Default nesting allowed inside one array element
pub const DEFAULT_MAX_ELEMENT_DEPTH: usize = 256;

/// Transformer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Run the validation pass and report its messages
    pub validate: bool,
    /// Let the validation pass repair final records
    pub fix: bool,
    /// Maximum conversions in flight (`None` = unbounded)
    pub max_in_flight: Option<usize>,
    /// Bytes read from the input per poll
    pub read_chunk_size: usize,
    /// Deepest nesting parsed inside one element; deeper elements fail alone
    pub max_element_depth: usize,
}

impl TransformConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With validation enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// With fix-ups enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// With admission limit on concurrent conversions
    #[inline]
    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = Some(max);
        self
    }

    /// With read chunk size (clamped to at least one byte)
    #[inline]
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// With nesting limit for a single element
    #[inline]
    #[must_use]
    pub fn with_max_element_depth(mut self, depth: usize) -> Self {
        self.max_element_depth = depth;
        self
    }

    /// Validation pass options derived from this config
    #[inline]
    #[must_use]
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            validate: self.validate,
            fix: self.fix,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            validate: false,
            fix: false,
            max_in_flight: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_element_depth: DEFAULT_MAX_ELEMENT_DEPTH,
        }
    }
}
