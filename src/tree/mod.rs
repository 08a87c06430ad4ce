//! Filter tree module
//!
//! This module owns the live, addressable tree of conditions and groups:
//! id assignment, CRUD at any depth, snapshots and the shared handle.

mod filter_tree;
mod path;
mod seed;
mod shared;

#[cfg(test)]
mod property_tests;

pub use filter_tree::*;
pub use path::NodePath;
pub use seed::*;
pub use shared::*;
