//! Link data → data field conversion
//!
//! Link data is an opaque JSON payload supplying values for add steps. The
//! default converter accepts:
//! - a scalar: one field, every `%s` filled with the scalar
//! - an object of subfield code → scalar: one field, each template subfield
//!   filled from its own code
//! - an array of either: one field per element

use crate::change::{AddFieldsChange, FieldTemplate};
use crate::error::ActionError;
use crate::format::{apply_format, has_placeholder};
use async_trait::async_trait;
use rlm_record::{Field, Subfield};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Converts link data plus an add template into concrete fields
#[async_trait]
pub trait LinkDataActions: Send + Sync + Debug {
    /// Build candidate fields for an add step
    ///
    /// # Errors
    /// Returns `ActionError::InvalidLinkData` if the payload shape is unusable
    async fn convert_link_data_to_fields(
        &self,
        link_data: Option<&Value>,
        change: &AddFieldsChange,
    ) -> Result<Vec<Field>, ActionError>;
}

/// Template-filling converter
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLinkDataActions;

impl DefaultLinkDataActions {
    /// Create new converter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkDataActions for DefaultLinkDataActions {
    async fn convert_link_data_to_fields(
        &self,
        link_data: Option<&Value>,
        change: &AddFieldsChange,
    ) -> Result<Vec<Field>, ActionError> {
        let elements: Vec<&Value> = match link_data {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
        };

        let mut fields = Vec::with_capacity(elements.len());
        for element in elements {
            let field = match element {
                Value::Object(map) => fill_from_object(&change.add, map)?,
                Value::Array(_) => {
                    return Err(ActionError::InvalidLinkData(
                        "nested arrays are not supported".to_string(),
                    ))
                }
                Value::Null => continue,
                scalar => fill_from_scalar(&change.add, &scalar_text(scalar)?),
            };

            if let Some(mut field) = field {
                field.sort_subfields(&change.order);
                fields.push(field);
            }
        }

        tracing::debug!(tag = %change.add.tag, count = fields.len(), "link data converted");
        Ok(fields)
    }
}

fn scalar_text(value: &Value) -> Result<String, ActionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ActionError::InvalidLinkData(format!(
            "expected scalar, got {other}"
        ))),
    }
}

fn fill_from_scalar(template: &FieldTemplate, value: &str) -> Option<Field> {
    let subfields = template
        .subfields
        .iter()
        .map(|sf| Subfield::new(sf.code.clone(), apply_format(&sf.value, value)))
        .collect();
    build(template, subfields)
}

fn fill_from_object(
    template: &FieldTemplate,
    values: &Map<String, Value>,
) -> Result<Option<Field>, ActionError> {
    let mut subfields = Vec::with_capacity(template.subfields.len());
    let mut filled = false;
    for sf in &template.subfields {
        if !has_placeholder(&sf.value) {
            subfields.push(sf.clone());
            continue;
        }
        match values.get(&sf.code) {
            Some(Value::Null) | None => {}
            Some(value) => {
                let text = scalar_text(value)?;
                subfields.push(Subfield::new(sf.code.clone(), apply_format(&sf.value, &text)));
                filled = true;
            }
        }
    }
    // Literal subfields alone carry no link data
    if !filled {
        return Ok(None);
    }
    Ok(build(template, subfields))
}

fn build(template: &FieldTemplate, subfields: Vec<Subfield>) -> Option<Field> {
    if subfields.is_empty() {
        return None;
    }
    Some(Field::data(
        template.tag.clone(),
        template.ind1.clone(),
        template.ind2.clone(),
        subfields,
    ))
}
