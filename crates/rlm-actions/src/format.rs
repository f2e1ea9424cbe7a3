//! `%s` placeholder substitution

/// Placeholder replaced by [`apply_format`]
pub const PLACEHOLDER: &str = "%s";

/// Substitute every `%s` in `format` with `value`
///
/// A format without a placeholder is returned as-is.
#[inline]
#[must_use]
pub fn apply_format(format: &str, value: &str) -> String {
    format.replace(PLACEHOLDER, value)
}

/// Whether `template` still expects a value
#[inline]
#[must_use]
pub fn has_placeholder(template: &str) -> bool {
    template.contains(PLACEHOLDER)
}
