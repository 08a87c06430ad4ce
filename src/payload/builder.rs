//! Strip live tree nodes down to wire payloads

use crate::condition::{FilterNode, LogicalOperator};
use crate::payload::{Payload, PayloadNode};

/// Build a payload from tree nodes, dropping every id
///
/// Returns `None` for an empty item list so that "no filter" stays distinct
/// from a filter group with nothing in it.
pub fn build_payload(items: &[FilterNode], operator: LogicalOperator) -> Option<Payload> {
    if items.is_empty() {
        return None;
    }

    Some(Payload {
        operator,
        condition: items.iter().map(strip_node).collect(),
    })
}

/// Strip ids from a single node and its subtree
pub fn strip_node(node: &FilterNode) -> PayloadNode {
    match node {
        FilterNode::Condition(c) => PayloadNode::Condition(c.predicate.clone()),
        FilterNode::Group(g) => PayloadNode::Group(Payload {
            operator: g.operator,
            condition: g.children.iter().map(strip_node).collect(),
        }),
    }
}

impl From<&FilterNode> for PayloadNode {
    fn from(node: &FilterNode) -> Self {
        strip_node(node)
    }
}
