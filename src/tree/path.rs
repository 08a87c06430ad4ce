//! Index paths addressing nodes at any depth

use crate::condition::{FilterNode, NodeId};
use smallvec::SmallVec;

/// Child indexes from the root down to a node; empty means the root itself
pub type NodePath = SmallVec<[usize; 8]>;

/// Locate `id` anywhere below `nodes`
pub fn find_path(nodes: &[FilterNode], id: NodeId) -> Option<NodePath> {
    let mut path = NodePath::new();
    if search(nodes, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn search(nodes: &[FilterNode], id: NodeId, path: &mut NodePath) -> bool {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        if node.id() == id {
            return true;
        }
        if let FilterNode::Group(g) = node {
            if search(&g.children, id, path) {
                return true;
            }
        }
        path.pop();
    }
    false
}

pub fn node_at<'a>(nodes: &'a [FilterNode], path: &[usize]) -> Option<&'a FilterNode> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get(first)?;
    for &index in rest {
        node = match node {
            FilterNode::Group(g) => g.children.get(index)?,
            FilterNode::Condition(_) => return None,
        };
    }
    Some(node)
}

pub fn node_at_mut<'a>(nodes: &'a mut [FilterNode], path: &[usize]) -> Option<&'a mut FilterNode> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get_mut(first)?;
    for &index in rest {
        node = match node {
            FilterNode::Group(g) => g.children.get_mut(index)?,
            FilterNode::Condition(_) => return None,
        };
    }
    Some(node)
}

/// Child list of the group at `path`, or `nodes` itself for the root
pub fn children_at_mut<'a>(
    nodes: &'a mut Vec<FilterNode>,
    path: &[usize],
) -> Option<&'a mut Vec<FilterNode>> {
    if path.is_empty() {
        return Some(nodes);
    }
    match node_at_mut(nodes, path)? {
        FilterNode::Group(g) => Some(&mut g.children),
        FilterNode::Condition(_) => None,
    }
}
