//! Filter Tree Core - Nested filter conditions with typed wire payloads
//!
//! This crate keeps an editable tree of filter conditions (leaves) and
//! logical groups, addressed by stable ids at any depth, and turns it into
//! the id-free payload a backend query endpoint consumes. Payloads can be
//! validated against field definitions, compared, copied, merged and
//! evaluated against records. Python bindings are available behind the
//! `python` feature.

pub mod condition;
pub mod config;
pub mod error;
pub mod payload;
pub mod tree;
pub mod validate;

#[cfg(feature = "python")]
mod python;

pub use condition::{
    Condition, ConditionGroup, FilterNode, LogicalOperator, NodeId, Operator, Predicate, RhsType,
    RhsValue, Scalar,
};
pub use config::{FieldDefinition, FieldDefinitions, FieldType, MalformedPolicy, TreeConfig};
pub use error::{FilterError, Result};
pub use payload::{are_equal, build_payload, clone_payload, merge, parse_payload, Payload, PayloadNode};
pub use tree::{ConditionPatch, FilterSnapshot, FilterTree, SeedNode, SharedFilterTree};
pub use validate::{validate_payload, ValidationError};
