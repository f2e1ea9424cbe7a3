//! End-of-pipeline validation and fix-up
//!
//! Runs on the folded record before the update decision. Fix-ups mutate the
//! record; validation only reports.

use rlm_record::Record;
use std::fmt::Debug;

/// Which passes a validator should run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report problems as messages and mark the record failed
    pub validate: bool,
    /// Repair what can be repaired before validating
    pub fix: bool,
}

impl ValidationOptions {
    /// Whether any pass is enabled
    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.validate || self.fix
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Record after fix-ups
    pub record: Record,
    /// Whether validation problems remain
    pub failed: bool,
    /// Human-readable problem descriptions
    pub messages: Vec<String>,
}

/// Validation/fix-up pass over a final record
pub trait RecordValidator: Send + Sync + Debug {
    /// Validate and optionally fix `record`
    fn validate(&self, record: Record, options: ValidationOptions) -> ValidationReport;
}

/// Structural validator
///
/// Checks:
/// - tags are three characters and subfield codes one character
/// - data fields carry at least one subfield
///
/// Fix trims subfield values of data fields and drops subfields left empty.
/// Control fields are left as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl RecordValidator for DefaultValidator {
    fn validate(&self, mut record: Record, options: ValidationOptions) -> ValidationReport {
        if options.fix {
            for field in record.all_fields_mut().filter(|f| !f.is_control()) {
                for sf in &mut field.subfields {
                    let trimmed = sf.value.trim();
                    if trimmed.len() != sf.value.len() {
                        sf.value = trimmed.to_string();
                    }
                }
                field.remove_subfields_where(|sf| sf.value.is_empty());
            }
        }

        let mut messages = Vec::new();
        if options.validate {
            for field in record.fields() {
                if let Err(e) = field.check_shape() {
                    messages.push(e.to_string());
                }
                if !field.is_control() && field.subfields.is_empty() {
                    messages.push(format!("field {} has no subfields", field.tag));
                }
            }
        }

        ValidationReport {
            record,
            failed: !messages.is_empty(),
            messages,
        }
    }
}
