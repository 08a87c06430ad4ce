//! Payload evaluator

use crate::condition::ast::{LogicalOperator, Operator, Predicate, RhsType, RhsValue, Scalar};
use crate::payload::{Payload, PayloadNode};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Field value types for evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Source of field values a payload is tested against
pub trait FieldSource {
    /// Value of `field`; `None` for missing or null
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl FieldSource for Map<String, Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match self.get(name)? {
            Value::Array(items) => Some(FieldValue::List(
                items.iter().filter_map(Scalar::from_json).collect(),
            )),
            other => Scalar::from_json(other).map(FieldValue::Scalar),
        }
    }
}

/// Evaluate an optional payload against a record; no filter matches all
pub fn evaluate(payload: Option<&Payload>, record: &impl FieldSource) -> bool {
    match payload {
        Some(p) => check_group(p.operator, &p.condition, record),
        None => true,
    }
}

fn check_group(operator: LogicalOperator, children: &[PayloadNode], record: &impl FieldSource) -> bool {
    let all = || children.iter().all(|child| check_node(child, record));
    match operator {
        LogicalOperator::And => all(),
        LogicalOperator::Or => children.iter().any(|child| check_node(child, record)),
        LogicalOperator::Not => !all(),
    }
}

fn check_node(node: &PayloadNode, record: &impl FieldSource) -> bool {
    match node {
        PayloadNode::Condition(p) => check_single(p, record),
        PayloadNode::Group(g) => check_group(g.operator, &g.condition, record),
    }
}

/// Evaluate one leaf
pub fn check_single(predicate: &Predicate, record: &impl FieldSource) -> bool {
    let value = record.field(&predicate.lhs_field);

    let operand = match predicate.rhs_type {
        RhsType::Constant => predicate.rhs_value.clone(),
        RhsType::Field => match resolve_field_operand(&predicate.rhs_value, record) {
            Some(v) => v,
            None => return false,
        },
    };

    match (predicate.operator, &value, &operand) {
        (Operator::Empty, v, _) => is_empty(v.as_ref()),
        (Operator::NotEmpty, v, _) => !is_empty(v.as_ref()),

        // Missing fields only satisfy the negative operators
        (Operator::Ne | Operator::NotContains | Operator::Nin | Operator::NotBetween, None, _) => {
            true
        }
        (_, None, _) => false,

        (Operator::Eq, Some(v), RhsValue::Scalar(cv)) => equals(v, cv),
        (Operator::Ne, Some(v), RhsValue::Scalar(cv)) => !equals(v, cv),

        (Operator::Gt, Some(FieldValue::Scalar(v)), RhsValue::Scalar(cv)) => {
            v.compare(cv) == Some(Ordering::Greater)
        }
        (Operator::Gte, Some(FieldValue::Scalar(v)), RhsValue::Scalar(cv)) => {
            matches!(v.compare(cv), Some(Ordering::Greater | Ordering::Equal))
        }
        (Operator::Lt, Some(FieldValue::Scalar(v)), RhsValue::Scalar(cv)) => {
            v.compare(cv) == Some(Ordering::Less)
        }
        (Operator::Lte, Some(FieldValue::Scalar(v)), RhsValue::Scalar(cv)) => {
            matches!(v.compare(cv), Some(Ordering::Less | Ordering::Equal))
        }

        (Operator::Contains, Some(v), RhsValue::Scalar(cv)) => contains(v, cv),
        (Operator::NotContains, Some(v), RhsValue::Scalar(cv)) => !contains(v, cv),

        (Operator::In, Some(v), RhsValue::List(items)) => items.iter().any(|cv| equals(v, cv)),
        (Operator::Nin, Some(v), RhsValue::List(items)) => !items.iter().any(|cv| equals(v, cv)),

        (Operator::Between, Some(FieldValue::Scalar(v)), RhsValue::Pair([low, high])) => {
            in_range(v, low, high)
        }
        (Operator::NotBetween, Some(FieldValue::Scalar(v)), RhsValue::Pair([low, high])) => {
            !in_range(v, low, high)
        }

        // Default: false for unsupported combinations
        _ => false,
    }
}

fn resolve_field_operand(rhs: &RhsValue, record: &impl FieldSource) -> Option<RhsValue> {
    let name = match rhs {
        RhsValue::Scalar(Scalar::String(name)) => name,
        _ => return None,
    };
    match record.field(name)? {
        FieldValue::Scalar(s) => Some(RhsValue::Scalar(s)),
        FieldValue::List(items) => Some(RhsValue::List(items)),
    }
}

fn is_empty(value: Option<&FieldValue>) -> bool {
    match value {
        None => true,
        Some(FieldValue::Scalar(Scalar::String(s))) => s.is_empty(),
        Some(FieldValue::List(items)) => items.is_empty(),
        Some(FieldValue::Scalar(_)) => false,
    }
}

/// Scalar equality; a list field equals a value it contains
fn equals(value: &FieldValue, operand: &Scalar) -> bool {
    match value {
        FieldValue::Scalar(v) => v == operand,
        FieldValue::List(items) => items.contains(operand),
    }
}

fn contains(value: &FieldValue, operand: &Scalar) -> bool {
    match (value, operand) {
        (FieldValue::Scalar(Scalar::String(s)), Scalar::String(needle)) => s.contains(needle.as_str()),
        (FieldValue::List(items), _) => items.contains(operand),
        _ => false,
    }
}

fn in_range(value: &Scalar, low: &Scalar, high: &Scalar) -> bool {
    matches!(value.compare(low), Some(Ordering::Greater | Ordering::Equal))
        && matches!(value.compare(high), Some(Ordering::Less | Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_payload;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected object"),
        }
    }

    fn check(payload: &str, rec: &Map<String, Value>) -> bool {
        let payload = parse_payload(payload).unwrap();
        evaluate(payload.as_ref(), rec)
    }

    #[test]
    fn test_no_filter_matches_everything() {
        let rec = record(json!({"status": "open"}));
        assert!(evaluate(None, &rec));
    }

    #[test]
    fn test_simple_comparison() {
        let rec = record(json!({"price": 10}));

        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"GT","rhsValue":5}]}"#, &rec));
        assert!(!check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"LT","rhsValue":5}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"GTE","rhsValue":10.0}]}"#, &rec));
    }

    #[test]
    fn test_and_or_not() {
        let rec = record(json!({"price": 10, "status": "open"}));

        let and = r#"{"operator":"And","condition":[
            {"lhsField":"price","operator":"GT","rhsValue":5},
            {"lhsField":"status","operator":"EQ","rhsValue":"done"}
        ]}"#;
        assert!(!check(and, &rec));

        let or = r#"{"operator":"Or","condition":[
            {"lhsField":"price","operator":"GT","rhsValue":5},
            {"lhsField":"status","operator":"EQ","rhsValue":"done"}
        ]}"#;
        assert!(check(or, &rec));

        let not = r#"{"operator":"And","condition":[
            {"operator":"Not","condition":[{"lhsField":"status","operator":"EQ","rhsValue":"done"}]}
        ]}"#;
        assert!(check(not, &rec));
    }

    #[test]
    fn test_empty_groups() {
        let rec = record(json!({}));
        assert!(check(r#"{"operator":"And","condition":[]}"#, &rec));
        assert!(!check(r#"{"operator":"Or","condition":[]}"#, &rec));
    }

    #[test]
    fn test_list_field_membership() {
        let rec = record(json!({"tags": ["red", "blue"]}));

        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"tags","operator":"EQ","rhsValue":"red"}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"tags","operator":"Contains","rhsValue":"blue"}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"tags","operator":"NotContains","rhsValue":"green"}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"tags","operator":"IN","rhsValue":["green","red"]}]}"#, &rec));
    }

    #[test]
    fn test_string_contains_and_range() {
        let rec = record(json!({"title": "running shoe", "price": 20}));

        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"title","operator":"Contains","rhsValue":"shoe"}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"Between","rhsValue":[10,20]}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"NotBetween","rhsValue":[30,40]}]}"#, &rec));
        assert!(!check(r#"{"operator":"And","condition":[{"lhsField":"price","operator":"Between","rhsValue":[21,30]}]}"#, &rec));
    }

    #[test]
    fn test_emptiness() {
        let rec = record(json!({"note": "", "tags": [], "owner": null, "name": "x"}));

        for field in ["note", "tags", "owner", "missing"] {
            let payload = format!(
                r#"{{"operator":"And","condition":[{{"lhsField":"{}","operator":"Empty"}}]}}"#,
                field
            );
            assert!(check(&payload, &rec), "Expected {} to be empty", field);
        }
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"name","operator":"NotEmpty"}]}"#, &rec));
    }

    #[test]
    fn test_field_reference_operand() {
        let rec = record(json!({"start": 5, "end": 9}));
        assert!(check(
            r#"{"operator":"And","condition":[{"lhsField":"end","operator":"GT","rhsValue":"start","rhsType":"Field"}]}"#,
            &rec
        ));
        assert!(!check(
            r#"{"operator":"And","condition":[{"lhsField":"end","operator":"GT","rhsValue":"nope","rhsType":"Field"}]}"#,
            &rec
        ));
    }

    #[test]
    fn test_missing_field() {
        let rec = record(json!({}));
        assert!(!check(r#"{"operator":"And","condition":[{"lhsField":"x","operator":"EQ","rhsValue":1}]}"#, &rec));
        assert!(check(r#"{"operator":"And","condition":[{"lhsField":"x","operator":"NE","rhsValue":1}]}"#, &rec));
    }
}
