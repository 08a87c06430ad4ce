//! Condition data model and evaluation
//!
//! This module defines leaf predicates (field, operator, operand), the
//! logical groups that combine them, node identities, and an evaluator that
//! tests a payload against a record.

mod ast;
mod evaluator;
mod node;


pub use ast::*;
pub use evaluator::*;
pub use node::*;
