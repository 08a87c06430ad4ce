//! Decode wire payloads from JSON

use crate::error::{FilterError, Result};
use crate::payload::Payload;
use serde_json::Value;

/// Parse a payload from a JSON string
///
/// `null` (or blank input) is "no filter" and yields `Ok(None)`.
pub fn parse_payload(json: &str) -> Result<Option<Payload>> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(json)?;
    payload_from_value(value)
}

/// Decode a payload from an already parsed JSON value
pub fn payload_from_value(value: Value) -> Result<Option<Payload>> {
    match &value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.contains_key("condition") => {}
        Value::Object(_) => {
            return Err(FilterError::InvalidPayload(
                "root must be a group with `operator` and `condition`".to_string(),
            ))
        }
        other => {
            return Err(FilterError::InvalidPayload(format!(
                "expected an object or null, got {}",
                json_kind(other)
            )))
        }
    }

    Ok(Some(serde_json::from_value(value)?))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{LogicalOperator, Operator, RhsType, RhsValue};
    use crate::payload::PayloadNode;

    #[test]
    fn test_parse_null_is_no_filter() {
        assert!(parse_payload("null").unwrap().is_none());
        assert!(parse_payload("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_nested_payload() {
        let payload = parse_payload(
            r#"{
                "operator": "And",
                "condition": [
                    {"lhsField": "price", "operator": "Between", "rhsValue": [10, 20]},
                    {"operator": "Or", "condition": [
                        {"lhsField": "status", "operator": "IN", "rhsValue": ["open", "done"]},
                        {"lhsField": "owner", "operator": "EQ", "rhsValue": "manager", "rhsType": "Field"}
                    ]}
                ]
            }"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(payload.operator, LogicalOperator::And);
        assert_eq!(payload.depth(), 2);

        let leaves = payload.predicates();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].rhs_value, RhsValue::pair(10, 20));
        assert_eq!(leaves[1].operator, Operator::In);
        assert_eq!(leaves[1].rhs_value, RhsValue::list(["open", "done"]));
        assert_eq!(leaves[2].rhs_type, RhsType::Field);

        match &payload.condition[1] {
            PayloadNode::Group(g) => assert_eq!(g.operator, LogicalOperator::Or),
            _ => panic!("Expected nested group"),
        }
    }

    #[test]
    fn test_parse_rejects_non_group_root() {
        assert!(matches!(
            parse_payload("[1, 2]"),
            Err(FilterError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"lhsField": "a", "operator": "EQ", "rhsValue": 1}"#),
            Err(FilterError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let result = parse_payload(
            r#"{"operator": "And", "condition": [{"lhsField": "a", "operator": "LIKE", "rhsValue": "x"}]}"#,
        );
        assert!(matches!(result, Err(FilterError::Deserialization(_))));
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(matches!(
            parse_payload("{not json"),
            Err(FilterError::Deserialization(_))
        ));
    }
}
