//! Pure operations over payloads: equality, copy, merge, request bodies

use crate::condition::LogicalOperator;
use crate::payload::{Payload, PayloadNode};
use serde_json::{json, Value};

/// Key under which list/count requests carry the filter
pub const FILTER_FIELD: &str = "Filter";

/// Structural equality of two optional payloads
///
/// Order-sensitive: children order is evaluation order. An absent operand
/// and a missing `rhsValue` are the same thing, as are an omitted `rhsType`
/// and an explicit `Constant`; both normalize to one representation when
/// decoded, so derived equality covers them.
pub fn are_equal(a: Option<&Payload>, b: Option<&Payload>) -> bool {
    a == b
}

/// Deep copy of an optional payload
pub fn clone_payload(payload: Option<&Payload>) -> Option<Payload> {
    payload.cloned()
}

/// Combine two payloads under `operator`
///
/// A missing side yields the other one unchanged. Otherwise both payloads
/// become the two children of a new group; groups sharing a combinator are
/// not flattened.
pub fn merge(a: Option<Payload>, b: Option<Payload>, operator: LogicalOperator) -> Option<Payload> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => Some(Payload {
            operator,
            condition: vec![PayloadNode::Group(a), PayloadNode::Group(b)],
        }),
    }
}

/// JSON body fragment for a list/count request
///
/// `{"Filter": <payload>}` when a filter is present, `{}` otherwise.
pub fn request_body(payload: Option<&Payload>) -> Value {
    match payload {
        Some(p) => json!({ FILTER_FIELD: p }),
        None => json!({}),
    }
}
