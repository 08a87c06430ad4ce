//! Mutable, addressable filter tree

use crate::condition::{
    Condition, ConditionGroup, FilterNode, IdGenerator, LogicalOperator, NodeId, Predicate,
};
use crate::config::TreeConfig;
use crate::error::Result;
use crate::payload::{build_payload, Payload};
use crate::tree::path::{children_at_mut, find_path, node_at, node_at_mut, NodePath};
use crate::tree::seed::{ConditionPatch, SeedNode};
use ahash::AHashSet;
use serde_json::Value;
use std::sync::Arc;

/// Filter tree with stable node ids and structural CRUD at any depth
///
/// The root is a conceptual group: `root_operator` over `children`.
/// Children sit behind an `Arc`, so a [`FilterSnapshot`] taken before a
/// mutation keeps seeing the old tree while the mutation works on a copy.
/// Addressing a missing node is always a no-op that leaves the tree, its
/// payload and its revision untouched.
#[derive(Debug, Clone)]
pub struct FilterTree {
    config: TreeConfig,
    ids: IdGenerator,
    root_operator: LogicalOperator,
    children: Arc<Vec<FilterNode>>,
    revision: u64,
}

/// Immutable view of a tree at one revision
#[derive(Debug, Clone)]
pub struct FilterSnapshot {
    root_operator: LogicalOperator,
    children: Arc<Vec<FilterNode>>,
    revision: u64,
}

impl FilterTree {
    /// Empty tree using the configured root operator
    pub fn new(config: TreeConfig) -> Self {
        Self {
            root_operator: config.default_root_operator,
            config,
            ids: IdGenerator::new(),
            children: Arc::new(Vec::new()),
            revision: 0,
        }
    }

    /// Tree pre-seeded with `seeds`
    ///
    /// Nodes without an id get a fresh one; supplied ids are kept unless an
    /// earlier node already claimed them. Malformed leaves are handled per
    /// `config.malformed_seeds`.
    pub fn with_initial(
        seeds: Vec<SeedNode>,
        root_operator: Option<LogicalOperator>,
        config: TreeConfig,
    ) -> Self {
        let mut tree = Self::new(config);
        if let Some(op) = root_operator {
            tree.root_operator = op;
        }

        // Supplied ids first, so generated ones can never collide with them
        for seed in &seeds {
            observe_ids(seed, &mut tree.ids);
        }

        let mut used = AHashSet::new();
        let children: Vec<FilterNode> = seeds
            .into_iter()
            .filter_map(|seed| tree.materialize(seed, &mut used))
            .collect();

        tracing::debug!(
            nodes = used.len(),
            root_operator = %tree.root_operator,
            "filter tree seeded"
        );

        tree.children = Arc::new(children);
        tree
    }

    /// Tree seeded from a wire payload; `None` gives an empty tree
    pub fn from_payload(payload: Option<&Payload>, config: TreeConfig) -> Self {
        match payload {
            Some(p) => {
                let seeds = p.condition.iter().map(SeedNode::from).collect();
                Self::with_initial(seeds, Some(p.operator), config)
            }
            None => Self::new(config),
        }
    }

    /// Tree seeded from a JSON array of seed nodes
    pub fn from_seed_json(
        json: &str,
        root_operator: Option<LogicalOperator>,
        config: TreeConfig,
    ) -> Result<Self> {
        let seeds = SeedNode::list_from_json(json)?;
        Ok(Self::with_initial(seeds, root_operator, config))
    }

    fn materialize(&mut self, seed: SeedNode, used: &mut AHashSet<NodeId>) -> Option<FilterNode> {
        let id = match seed.id() {
            Some(id) if IdGenerator::accepts(id) && used.insert(id) => id,
            supplied => {
                let Some(id) = self.ids.next_id() else {
                    tracing::warn!(supplied = ?supplied, "dropping seed node: id space exhausted");
                    return None;
                };
                if let Some(rejected) = supplied {
                    tracing::debug!(supplied = %rejected, replacement = %id, "seed id replaced");
                }
                used.insert(id);
                id
            }
        };

        match seed {
            SeedNode::Condition(c) => {
                let predicate = c.resolve(self.config.malformed_seeds)?;
                Some(FilterNode::Condition(Condition { id, predicate }))
            }
            SeedNode::Group(g) => {
                let children = g
                    .condition
                    .into_iter()
                    .filter_map(|child| self.materialize(child, used))
                    .collect();
                Some(FilterNode::Group(ConditionGroup {
                    id,
                    operator: g.operator,
                    children,
                }))
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append a leaf to the root, or to the group `parent`
    ///
    /// Returns the new id, or `None` (tree unchanged, no id consumed) when
    /// `parent` does not name an existing group or the id space is used up.
    pub fn add(&mut self, predicate: Predicate, parent: Option<NodeId>) -> Option<NodeId> {
        let target = self.resolve_parent(parent)?;
        let id = self.next_id()?;
        self.attach(&target, FilterNode::Condition(Condition { id, predicate }));
        tracing::trace!(id = %id, parent = ?parent, "condition added");
        Some(id)
    }

    /// Append an empty group to the root, or to the group `parent`
    pub fn add_group(&mut self, operator: LogicalOperator, parent: Option<NodeId>) -> Option<NodeId> {
        let target = self.resolve_parent(parent)?;
        let id = self.next_id()?;
        self.attach(
            &target,
            FilterNode::Group(ConditionGroup {
                id,
                operator,
                children: Vec::new(),
            }),
        );
        tracing::trace!(id = %id, operator = %operator, parent = ?parent, "group added");
        Some(id)
    }

    /// Apply `patch` to the leaf `id`
    ///
    /// Returns `false` when `id` is missing or names a group.
    pub fn update(&mut self, id: NodeId, patch: ConditionPatch) -> bool {
        let Some(path) = self.leaf_path(id) else {
            return false;
        };
        if patch.is_empty() {
            return true;
        }

        let children = Arc::make_mut(&mut self.children);
        if let Some(FilterNode::Condition(c)) = node_at_mut(children, &path) {
            patch.apply(&mut c.predicate);
            self.revision += 1;
            tracing::trace!(id = %id, "condition updated");
        }
        true
    }

    /// Apply a JSON patch object to the leaf `id`
    ///
    /// The operand is shaped by the leaf's current operator unless the
    /// patch changes it. Returns `Ok(false)` when `id` is not a leaf.
    pub fn update_from_value(&mut self, id: NodeId, patch: &Value) -> Result<bool> {
        let current = match self.get(id) {
            Some(FilterNode::Condition(c)) => c.predicate.operator,
            _ => {
                tracing::debug!(id = %id, "update skipped: no such condition");
                return Ok(false);
            }
        };
        let patch = ConditionPatch::from_value(patch, current)?;
        Ok(self.update(id, patch))
    }

    /// Change the combinator of the group `id`
    pub fn update_group_operator(&mut self, id: NodeId, operator: LogicalOperator) -> bool {
        let path = match find_path(&self.children, id) {
            Some(path) if node_at(&self.children, &path).is_some_and(FilterNode::is_group) => path,
            _ => {
                tracing::debug!(id = %id, "group operator update skipped: no such group");
                return false;
            }
        };

        let children = Arc::make_mut(&mut self.children);
        if let Some(FilterNode::Group(g)) = node_at_mut(children, &path) {
            if g.operator != operator {
                g.operator = operator;
                self.revision += 1;
                tracing::trace!(id = %id, operator = %operator, "group operator updated");
            }
        }
        true
    }

    /// Remove the node `id` and its whole subtree, wherever it sits
    pub fn remove(&mut self, id: NodeId) -> Option<FilterNode> {
        let Some(path) = find_path(&self.children, id) else {
            tracing::debug!(id = %id, "remove skipped: no such node");
            return None;
        };
        let (&index, parent_path) = path.split_last()?;

        let children = Arc::make_mut(&mut self.children);
        let siblings = children_at_mut(children, parent_path)?;
        let removed = siblings.remove(index);
        self.revision += 1;
        tracing::trace!(id = %id, nodes = removed.subtree_len(), "node removed");
        Some(removed)
    }

    /// Drop every node; the id sequence keeps running
    pub fn clear(&mut self) {
        if self.children.is_empty() {
            return;
        }
        self.children = Arc::new(Vec::new());
        self.revision += 1;
        tracing::trace!("filter tree cleared");
    }

    /// Change the root combinator
    pub fn set_root_operator(&mut self, operator: LogicalOperator) {
        if self.root_operator != operator {
            self.root_operator = operator;
            self.revision += 1;
        }
    }

    fn resolve_parent(&self, parent: Option<NodeId>) -> Option<NodePath> {
        let Some(parent) = parent else {
            return Some(NodePath::new());
        };

        match find_path(&self.children, parent) {
            Some(path) if node_at(&self.children, &path).is_some_and(FilterNode::is_group) => {
                Some(path)
            }
            Some(_) => {
                tracing::debug!(parent = %parent, "add skipped: parent is a condition");
                None
            }
            None => {
                tracing::debug!(parent = %parent, "add skipped: no such parent group");
                None
            }
        }
    }

    fn next_id(&mut self) -> Option<NodeId> {
        let id = self.ids.next_id();
        if id.is_none() {
            tracing::warn!("add skipped: id space exhausted");
        }
        id
    }

    fn leaf_path(&self, id: NodeId) -> Option<NodePath> {
        match find_path(&self.children, id) {
            Some(path) if node_at(&self.children, &path).is_some_and(|n| !n.is_group()) => {
                Some(path)
            }
            _ => {
                tracing::debug!(id = %id, "update skipped: no such condition");
                None
            }
        }
    }

    fn attach(&mut self, parent: &[usize], node: FilterNode) {
        let children = Arc::make_mut(&mut self.children);
        if let Some(siblings) = children_at_mut(children, parent) {
            siblings.push(node);
            self.revision += 1;
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Node `id` at any depth
    pub fn get(&self, id: NodeId) -> Option<&FilterNode> {
        let path = find_path(&self.children, id)?;
        node_at(&self.children, &path)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        find_path(&self.children, id).is_some()
    }

    /// Id of the group enclosing `id`
    ///
    /// `None` both for root-level nodes and for unknown ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let path = find_path(&self.children, id)?;
        let (_, parent_path) = path.split_last()?;
        node_at(&self.children, parent_path).map(FilterNode::id)
    }

    pub fn root_operator(&self) -> LogicalOperator {
        self.root_operator
    }

    /// Root-level nodes, in order
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Total number of nodes at every depth
    pub fn node_count(&self) -> usize {
        self.children.iter().map(FilterNode::subtree_len).sum()
    }

    /// Every node id in pre-order
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.node_count());
        for node in self.children.iter() {
            node.walk(&mut |n| ids.push(n.id()));
        }
        ids
    }

    /// Incremented on every effective mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when the tree holds at least one node
    pub fn has_conditions(&self) -> bool {
        !self.children.is_empty()
    }

    /// Wire payload; `None` when the tree is empty
    pub fn payload(&self) -> Option<Payload> {
        build_payload(&self.children, self.root_operator)
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            root_operator: self.root_operator,
            children: Arc::clone(&self.children),
            revision: self.revision,
        }
    }
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

fn observe_ids(seed: &SeedNode, ids: &mut IdGenerator) {
    if let Some(id) = seed.id() {
        ids.observe(id);
    }
    if let SeedNode::Group(g) = seed {
        for child in &g.condition {
            observe_ids(child, ids);
        }
    }
}

impl FilterSnapshot {
    pub fn root_operator(&self) -> LogicalOperator {
        self.root_operator
    }

    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_conditions(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn payload(&self) -> Option<Payload> {
        build_payload(&self.children, self.root_operator)
    }

    pub fn get(&self, id: NodeId) -> Option<&FilterNode> {
        let path = find_path(&self.children, id)?;
        node_at(&self.children, &path)
    }

    /// Cheap change detection: true when both views share the same tree
    pub fn same_as(&self, other: &FilterSnapshot) -> bool {
        Arc::ptr_eq(&self.children, &other.children) && self.root_operator == other.root_operator
    }
}
