//! Lock-guarded handle to a filter tree
//!
//! Every mutation runs under the write lock against the tree as it is at
//! that moment, so edits dispatched back to back never work from a stale
//! copy and never lose each other's changes.

use crate::condition::{FilterNode, LogicalOperator, NodeId, Predicate};
use crate::payload::Payload;
use crate::tree::filter_tree::{FilterSnapshot, FilterTree};
use crate::tree::seed::ConditionPatch;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle; clones address the same tree
#[derive(Debug, Clone, Default)]
pub struct SharedFilterTree {
    inner: Arc<RwLock<FilterTree>>,
}

impl SharedFilterTree {
    pub fn new(tree: FilterTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Run `f` with exclusive access to the current tree
    #[inline]
    pub fn mutate<R>(&self, f: impl FnOnce(&mut FilterTree) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut *guard)
    }

    /// Run `f` with shared access to the current tree
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&FilterTree) -> R) -> R {
        let guard = self.inner.read();
        f(&*guard)
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.read(FilterTree::snapshot)
    }

    pub fn payload(&self) -> Option<Payload> {
        self.read(FilterTree::payload)
    }

    pub fn has_conditions(&self) -> bool {
        self.read(FilterTree::has_conditions)
    }

    pub fn get(&self, id: NodeId) -> Option<FilterNode> {
        self.read(|tree| tree.get(id).cloned())
    }

    pub fn add(&self, predicate: Predicate, parent: Option<NodeId>) -> Option<NodeId> {
        self.mutate(|tree| tree.add(predicate, parent))
    }

    pub fn add_group(&self, operator: LogicalOperator, parent: Option<NodeId>) -> Option<NodeId> {
        self.mutate(|tree| tree.add_group(operator, parent))
    }

    pub fn update(&self, id: NodeId, patch: ConditionPatch) -> bool {
        self.mutate(|tree| tree.update(id, patch))
    }

    pub fn update_group_operator(&self, id: NodeId, operator: LogicalOperator) -> bool {
        self.mutate(|tree| tree.update_group_operator(id, operator))
    }

    pub fn remove(&self, id: NodeId) -> Option<FilterNode> {
        self.mutate(|tree| tree.remove(id))
    }

    pub fn clear(&self) {
        self.mutate(FilterTree::clear)
    }

    pub fn set_root_operator(&self, operator: LogicalOperator) {
        self.mutate(|tree| tree.set_root_operator(operator))
    }
}

impl From<FilterTree> for SharedFilterTree {
    fn from(tree: FilterTree) -> Self {
        Self::new(tree)
    }
}
