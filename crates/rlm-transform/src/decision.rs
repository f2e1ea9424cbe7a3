//! Record update decision
//!
//! Compares the pre-change snapshot with the folded record so downstream
//! consumers can skip records that did not change.

use rlm_record::Record;
use serde::{Deserialize, Serialize};

/// Message attached to results whose record did not change
pub const NO_UPDATE_MESSAGE: &str = "No update needed!";

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Outcome of converting one batch element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Whether the record differs from its snapshot
    pub updated: bool,
    /// Whether the validation pass rejected the final record
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
    /// Final record
    pub record: Record,
    /// Human-readable notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Classify a fold outcome against its snapshot
///
/// Equality is structural: tags, indicators, subfields, values and order.
#[must_use]
pub fn decide(original: &Record, final_record: Record) -> ConversionResult {
    if *original == final_record {
        ConversionResult {
            updated: false,
            failed: false,
            record: final_record,
            messages: vec![NO_UPDATE_MESSAGE.to_string()],
        }
    } else {
        ConversionResult {
            updated: true,
            failed: false,
            record: final_record,
            messages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rlm_record::{Field, Subfield};
    use rlm_test_utils::sample_record;
    use serde_json::json;

    #[test]
    fn unchanged_record_is_not_updated() {
        let record = sample_record();
        let result = decide(&record, record.clone());
        assert!(!result.updated);
        assert_eq!(result.messages, vec![NO_UPDATE_MESSAGE.to_string()]);
    }

    #[test]
    fn changed_record_is_updated() {
        let record = sample_record();
        let mut changed = record.clone();
        changed.insert_field(Field::control("003", "FI-MELINDA"));
        let result = decide(&record, changed.clone());
        assert!(result.updated);
        assert_eq!(result.record, changed);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn serialized_shape() {
        let record = Record::new();
        let value = serde_json::to_value(decide(&record, record.clone())).unwrap();
        assert_eq!(
            value,
            json!({"updated": false, "record": {"fields": []}, "messages": ["No update needed!"]})
        );
    }

    proptest! {
        #[test]
        fn prop_updated_iff_not_equal(
            original in proptest::collection::vec(("[a-c]", "[x-z]{0,2}"), 0..4),
            folded in proptest::collection::vec(("[a-c]", "[x-z]{0,2}"), 0..4),
        ) {
            let build = |subfields: &[(String, String)]| {
                Record::with_fields("", vec![Field::data(
                    "500",
                    " ",
                    " ",
                    subfields.iter().map(|(c, v)| Subfield::new(c.clone(), v.clone())).collect(),
                )])
            };
            let before = build(&original);
            let after = build(&folded);

            let result = decide(&before, after.clone());
            prop_assert_eq!(result.updated, before != after);
            prop_assert_eq!(result.record, after);
        }
    }
}
