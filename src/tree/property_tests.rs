//! Property tests for the filter tree
//!
//! Id uniqueness, id-free payloads, depth-independent addressing, no-op
//! behavior on missing ids and the monotonic id sequence across `clear`.

use ahash::AHashSet;
use proptest::prelude::*;
use serde_json::Value;

use crate::condition::{FilterNode, LogicalOperator, NodeId, Operator, Predicate, RhsValue};
use crate::tree::{ConditionPatch, FilterTree};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// One tree edit; selectors pick among every id issued so far (live or not)
#[derive(Debug, Clone)]
enum Edit {
    AddLeaf { parent: usize, value: i64 },
    AddGroup { parent: usize, operator: LogicalOperator },
    Remove { target: usize },
    Update { target: usize, value: i64 },
    SetGroupOperator { target: usize, operator: LogicalOperator },
    Clear,
}

fn logical_strategy() -> impl Strategy<Value = LogicalOperator> {
    prop_oneof![
        Just(LogicalOperator::And),
        Just(LogicalOperator::Or),
        Just(LogicalOperator::Not),
    ]
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (any::<usize>(), -100..=100i64).prop_map(|(parent, value)| Edit::AddLeaf { parent, value }),
        3 => (any::<usize>(), logical_strategy()).prop_map(|(parent, operator)| Edit::AddGroup { parent, operator }),
        2 => any::<usize>().prop_map(|target| Edit::Remove { target }),
        2 => (any::<usize>(), -100..=100i64).prop_map(|(target, value)| Edit::Update { target, value }),
        1 => (any::<usize>(), logical_strategy()).prop_map(|(target, operator)| Edit::SetGroupOperator { target, operator }),
        1 => Just(Edit::Clear),
    ]
}

/// `None` (root) for selector 0, otherwise one of the issued ids
fn pick(issued: &[NodeId], selector: usize) -> Option<NodeId> {
    let slot = selector % (issued.len() + 1);
    if slot == 0 {
        None
    } else {
        Some(issued[slot - 1])
    }
}

fn leaf(value: i64) -> Predicate {
    Predicate::new("n", Operator::Eq, value)
}

/// Apply edits, returning the tree and every id ever issued
fn run_edits(edits: &[Edit]) -> (FilterTree, Vec<NodeId>) {
    let mut tree = FilterTree::default();
    let mut issued = Vec::new();

    for edit in edits {
        match edit {
            Edit::AddLeaf { parent, value } => {
                if let Some(id) = tree.add(leaf(*value), pick(&issued, *parent)) {
                    issued.push(id);
                }
            }
            Edit::AddGroup { parent, operator } => {
                if let Some(id) = tree.add_group(*operator, pick(&issued, *parent)) {
                    issued.push(id);
                }
            }
            Edit::Remove { target } => {
                if let Some(id) = pick(&issued, *target) {
                    tree.remove(id);
                }
            }
            Edit::Update { target, value } => {
                if let Some(id) = pick(&issued, *target) {
                    tree.update(id, ConditionPatch::new().rhs_value(*value));
                }
            }
            Edit::SetGroupOperator { target, operator } => {
                if let Some(id) = pick(&issued, *target) {
                    tree.update_group_operator(id, *operator);
                }
            }
            Edit::Clear => tree.clear(),
        }
    }

    (tree, issued)
}

fn contains_id_key(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("id") || map.values().any(contains_id_key),
        Value::Array(items) => items.iter().any(contains_id_key),
        _ => false,
    }
}

/// Wrap `leaf_value` in `depth` nested groups, each with a sibling leaf
fn nested_tree(depth: usize, leaf_value: i64) -> (FilterTree, Vec<NodeId>, NodeId) {
    let mut tree = FilterTree::default();
    let mut groups = Vec::new();
    let mut parent = None;

    for level in 0..depth {
        let g = tree.add_group(LogicalOperator::Or, parent).unwrap();
        tree.add(leaf(level as i64 * 1000), Some(g)).unwrap();
        groups.push(g);
        parent = Some(g);
    }

    let target = tree.add(leaf(leaf_value), parent).unwrap();
    (tree, groups, target)
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Every id ever returned is distinct, including after removals and clears
    #[test]
    fn prop_ids_never_repeat(edits in prop::collection::vec(edit_strategy(), 0..60)) {
        let (tree, issued) = run_edits(&edits);

        let unique: AHashSet<_> = issued.iter().copied().collect();
        prop_assert_eq!(unique.len(), issued.len());

        // Live ids are a subset of issued ones, each appearing once
        let live = tree.ids();
        let live_unique: AHashSet<_> = live.iter().copied().collect();
        prop_assert_eq!(live_unique.len(), live.len());
        prop_assert!(live.iter().all(|id| unique.contains(id)));
    }

    /// Payloads never carry ids, and exist exactly when the tree is non-empty
    #[test]
    fn prop_payload_is_id_free(edits in prop::collection::vec(edit_strategy(), 0..60)) {
        let (tree, _) = run_edits(&edits);
        let payload = tree.payload();

        prop_assert_eq!(tree.has_conditions(), payload.is_some());
        if let Some(p) = payload {
            let encoded = serde_json::to_value(&p).unwrap();
            prop_assert!(!contains_id_key(&encoded), "id leaked into {}", encoded);
        }
    }

    /// Leaves are addressable regardless of depth
    #[test]
    fn prop_depth_independent_addressing(depth in 1..=5usize, value in -100..=100i64) {
        let (mut tree, groups, target) = nested_tree(depth, value);
        let parent = *groups.last().unwrap();

        prop_assert_eq!(
            tree.get(target).and_then(FilterNode::as_condition).map(|c| c.predicate.clone()),
            Some(leaf(value))
        );

        prop_assert!(tree.update(target, ConditionPatch::new().rhs_value(value + 1)));
        let updated = tree.get(target).and_then(FilterNode::as_condition).unwrap();
        prop_assert_eq!(&updated.predicate.rhs_value, &RhsValue::from(value + 1));

        let count_before = tree.node_count();
        let siblings_before = tree.get(parent).and_then(FilterNode::as_group).unwrap().children.len();

        prop_assert!(tree.remove(target).is_some());
        prop_assert!(tree.get(target).is_none());
        prop_assert_eq!(tree.node_count(), count_before - 1);

        let siblings_after = tree.get(parent).and_then(FilterNode::as_group).unwrap().children.len();
        prop_assert_eq!(siblings_after, siblings_before - 1);
        for g in &groups {
            prop_assert!(tree.contains(*g));
        }
    }

    /// Operations on ids that do not exist change nothing
    #[test]
    fn prop_missing_ids_are_noops(
        edits in prop::collection::vec(edit_strategy(), 0..40),
        offset in 1..1000u64
    ) {
        let (mut tree, issued) = run_edits(&edits);
        let missing = NodeId(issued.iter().map(|id| id.0).max().unwrap_or(0) + offset);

        let payload = tree.payload();
        let revision = tree.revision();
        let snapshot = tree.snapshot();

        prop_assert!(!tree.update(missing, ConditionPatch::new().lhs_field("x")));
        prop_assert!(!tree.update_group_operator(missing, LogicalOperator::Not));
        prop_assert!(tree.remove(missing).is_none());
        prop_assert!(tree.add(leaf(1), Some(missing)).is_none());
        prop_assert!(tree.add_group(LogicalOperator::Or, Some(missing)).is_none());
        prop_assert!(tree.get(missing).is_none());

        prop_assert_eq!(tree.payload(), payload);
        prop_assert_eq!(tree.revision(), revision);
        prop_assert!(snapshot.same_as(&tree.snapshot()));
    }

    /// Clearing empties the tree without resetting the id sequence
    #[test]
    fn prop_clear_keeps_sequence(edits in prop::collection::vec(edit_strategy(), 0..40)) {
        let (mut tree, issued) = run_edits(&edits);

        tree.clear();
        prop_assert!(!tree.has_conditions());
        prop_assert!(tree.payload().is_none());

        let next = tree.add(leaf(0), None).unwrap();
        prop_assert!(issued.iter().all(|id| *id < next));
    }
}
