//! Tree nodes and node identities

use crate::condition::ast::{LogicalOperator, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a node in a live filter tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source owned by a single tree
///
/// Ids handed out are never handed out again, whatever happens to the nodes
/// that carried them.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Largest id a caller may supply; anything above is replaced with a
    /// fresh id so the sequence always has room left
    pub const MAX_SUPPLIED: u64 = u64::MAX >> 1;

    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Next unused id, or `None` once the id space is exhausted
    #[inline]
    pub fn next_id(&mut self) -> Option<NodeId> {
        let id = NodeId(self.next);
        self.next = self.next.checked_add(1)?;
        Some(id)
    }

    /// Whether a caller-supplied id can be kept as is
    #[inline]
    pub fn accepts(id: NodeId) -> bool {
        id.0 <= Self::MAX_SUPPLIED
    }

    /// Record an externally supplied id so it is never generated later
    ///
    /// Ids that [`IdGenerator::accepts`] rejects are ignored.
    #[inline]
    pub fn observe(&mut self, id: NodeId) {
        if Self::accepts(id) && id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }

    /// Value the next call to `next_id` will use
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Leaf node of a live tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub id: NodeId,
    #[serde(flatten)]
    pub predicate: Predicate,
}

/// Internal node of a live tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionGroup {
    pub id: NodeId,
    pub operator: LogicalOperator,
    #[serde(rename = "condition")]
    pub children: Vec<FilterNode>,
}

/// Either a leaf condition or a condition group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Condition(Condition),
    Group(ConditionGroup),
}

impl FilterNode {
    #[inline]
    pub fn id(&self) -> NodeId {
        match self {
            FilterNode::Condition(c) => c.id,
            FilterNode::Group(g) => g.id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FilterNode::Group(_))
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            FilterNode::Condition(c) => Some(c),
            FilterNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            FilterNode::Group(g) => Some(g),
            FilterNode::Condition(_) => None,
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        match self {
            FilterNode::Condition(_) => 1,
            FilterNode::Group(g) => 1 + g.children.iter().map(FilterNode::subtree_len).sum::<usize>(),
        }
    }

    /// Visit every node of this subtree in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FilterNode)) {
        visit(self);
        if let FilterNode::Group(g) = self {
            for child in &g.children {
                child.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ast::Operator;
    use serde_json::json;

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut ids = IdGenerator::new();
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();
        assert!(b > a);

        ids.observe(NodeId(40));
        assert_eq!(ids.next_id(), Some(NodeId(41)));

        // Observing a lower id never rewinds the counter
        ids.observe(NodeId(3));
        assert_eq!(ids.peek(), NodeId(42));
    }

    #[test]
    fn test_id_generator_ignores_oversized_ids() {
        let mut ids = IdGenerator::new();
        ids.observe(NodeId(u64::MAX));
        assert!(!IdGenerator::accepts(NodeId(u64::MAX)));
        assert_eq!(ids.next_id(), Some(NodeId(1)));

        ids.observe(NodeId(IdGenerator::MAX_SUPPLIED));
        assert_eq!(ids.next_id(), Some(NodeId(IdGenerator::MAX_SUPPLIED + 1)));
    }

    #[test]
    fn test_id_generator_exhaustion_returns_none() {
        let mut ids = IdGenerator { next: u64::MAX - 1 };
        assert_eq!(ids.next_id(), Some(NodeId(u64::MAX - 1)));
        assert_eq!(ids.next_id(), None);
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn test_live_node_serializes_with_ids() {
        let node = FilterNode::Group(ConditionGroup {
            id: NodeId(1),
            operator: LogicalOperator::Or,
            children: vec![FilterNode::Condition(Condition {
                id: NodeId(2),
                predicate: Predicate::new("status", Operator::Eq, "done"),
            })],
        });

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "id": 1,
                "operator": "Or",
                "condition": [
                    {"id": 2, "lhsField": "status", "operator": "EQ", "rhsValue": "done"}
                ]
            })
        );
        assert_eq!(node.subtree_len(), 2);
    }
}
