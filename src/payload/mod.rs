//! Wire payload for filters
//!
//! A payload is the identity-stripped form of a filter tree, shaped as
//! `{ "operator": .., "condition": [..] }` with nested groups of the same
//! shape. "No filter" is `None`, never an empty payload.

mod builder;
mod ops;
mod parser;


pub use builder::*;
pub use ops::*;
pub use parser::*;

use crate::condition::{LogicalOperator, Predicate};
use serde::{Deserialize, Serialize};

/// Root or nested group of a wire payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub operator: LogicalOperator,
    pub condition: Vec<PayloadNode>,
}

/// Child of a payload group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadNode {
    Group(Payload),
    Condition(Predicate),
}

impl Payload {
    pub fn new(operator: LogicalOperator, condition: Vec<PayloadNode>) -> Self {
        Self { operator, condition }
    }

    /// All leaf predicates, in pre-order
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        collect_predicates(&self.condition, &mut out);
        out
    }

    /// Nesting depth; a payload of leaves only has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .condition
            .iter()
            .map(|node| match node {
                PayloadNode::Group(g) => g.depth(),
                PayloadNode::Condition(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

fn collect_predicates<'a>(nodes: &'a [PayloadNode], out: &mut Vec<&'a Predicate>) {
    for node in nodes {
        match node {
            PayloadNode::Condition(p) => out.push(p),
            PayloadNode::Group(g) => collect_predicates(&g.condition, out),
        }
    }
}
