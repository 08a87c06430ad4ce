//! Payload validator

use crate::condition::{OperandShape, Operator, Predicate, RhsType, RhsValue, Scalar};
use crate::config::{FieldDefinition, FieldDefinitions, FieldType};
use crate::payload::Payload;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A problem with one leaf, scoped to its field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every leaf of `payload` against `fields`
///
/// Each leaf reports at most one error, the first rule it breaks. An empty
/// result means the payload is valid; no payload is trivially valid.
pub fn validate_payload(payload: Option<&Payload>, fields: &FieldDefinitions) -> Vec<ValidationError> {
    let Some(payload) = payload else {
        return Vec::new();
    };

    let errors: Vec<ValidationError> = payload
        .predicates()
        .into_iter()
        .filter_map(|p| validate_predicate(p, fields))
        .collect();

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "payload failed validation");
    }
    errors
}

/// Validate a single leaf; `None` when it passes
pub fn validate_predicate(predicate: &Predicate, fields: &FieldDefinitions) -> Option<ValidationError> {
    let field = predicate.lhs_field.as_str();
    let fail = |message: String| Some(ValidationError::new(field, message));

    let Some(definition) = fields.get(field) else {
        return fail("unknown field".to_string());
    };

    if !definition.allows(predicate.operator) {
        return fail(format!(
            "operator `{}` is not permitted for type `{}`",
            predicate.operator, definition.field_type
        ));
    }

    if let Err(message) = check_shape(predicate.operator, &predicate.rhs_value) {
        return fail(message);
    }

    if predicate.rhs_type == RhsType::Field {
        return check_field_reference(&predicate.rhs_value, fields).err().and_then(fail);
    }

    for value in predicate.rhs_value.as_slice() {
        if let Err(message) = check_kind(definition, value) {
            return fail(message);
        }
    }

    if let RhsValue::Pair([low, high]) = &predicate.rhs_value {
        if low.compare(high) == Some(Ordering::Greater) {
            return fail(format!(
                "range lower bound {} exceeds upper bound {}",
                low, high
            ));
        }
    }

    None
}

fn check_shape(operator: Operator, value: &RhsValue) -> Result<(), String> {
    let expected = operator.operand_shape();
    let ok = match (expected, value) {
        (OperandShape::None, RhsValue::Absent) => true,
        (OperandShape::Scalar, RhsValue::Scalar(_)) => true,
        (OperandShape::Pair, RhsValue::Pair(_)) => true,
        (OperandShape::List, RhsValue::List(items)) => !items.is_empty(),
        _ => false,
    };

    if ok {
        Ok(())
    } else if expected == OperandShape::None {
        Err(format!("operator `{}` takes no value", operator))
    } else {
        Err(format!("operator `{}` requires {}", operator, expected))
    }
}

fn check_field_reference(value: &RhsValue, fields: &FieldDefinitions) -> Result<(), String> {
    for item in value.as_slice() {
        match item.as_str() {
            Some(name) if fields.contains(name) => {}
            Some(name) => return Err(format!("referenced field `{}` is unknown", name)),
            None => return Err("field reference must be a field name".to_string()),
        }
    }
    Ok(())
}

fn check_kind(definition: &FieldDefinition, value: &Scalar) -> Result<(), String> {
    let field_type = definition.field_type;
    let ok = match field_type {
        FieldType::Number | FieldType::Currency => value.is_numeric(),
        FieldType::Boolean => matches!(value, Scalar::Bool(_)),
        FieldType::String => matches!(value, Scalar::String(_)),
        FieldType::Date => matches!(value, Scalar::String(_) | Scalar::Int(_)),
        FieldType::Select => match &definition.select_options {
            Some(options) => {
                if !options.contains(value) {
                    return Err(format!("value {} is not one of the select options", value));
                }
                true
            }
            None => matches!(value, Scalar::String(_)) || value.is_numeric(),
        },
    };

    if ok {
        Ok(())
    } else {
        Err(format!(
            "{} value {} does not match type `{}`",
            value.kind(),
            value,
            field_type
        ))
    }
}
