//! Python bindings
//!
//! Every structured value crosses the boundary as a JSON string, in the same
//! camelCase wire shape the Rust side serializes.

use pyo3::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::condition::{LogicalOperator, NodeId, Predicate};
use crate::config::{load_tree_config, FieldDefinitions, TreeConfig};
use crate::error::{FilterError, Result};
use crate::payload::{self, parse_payload, Payload};
use crate::tree::{FilterTree as Tree, SharedFilterTree};
use crate::validate;

// ============================================================================
// Helper Functions
// ============================================================================

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn logical_operator(name: &str) -> Result<LogicalOperator> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| FilterError::InvalidPayload(format!("unknown group operator `{}`", name)))
}

/// Serialize an optional payload; no filter is `None` on the Python side
fn payload_json(payload: Option<&Payload>) -> Result<Option<String>> {
    payload.map(to_json).transpose()
}

// ============================================================================
// FilterTree PyClass
// ============================================================================

/// Editable filter tree held in Rust memory
#[pyclass(name = "FilterTree")]
pub struct PyFilterTree {
    inner: SharedFilterTree,
}

#[pymethods]
impl PyFilterTree {
    /// Create a tree, optionally seeded from a JSON array of nodes
    #[new]
    #[pyo3(signature = (initial=None, root_operator=None, config=None))]
    fn new(initial: Option<&str>, root_operator: Option<&str>, config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(json) => load_tree_config(json)?,
            None => TreeConfig::default(),
        };
        let root_operator = root_operator.map(logical_operator).transpose()?;

        let tree = match initial {
            Some(json) => Tree::from_seed_json(json, root_operator, config)?,
            None => {
                let mut tree = Tree::new(config);
                if let Some(op) = root_operator {
                    tree.set_root_operator(op);
                }
                tree
            }
        };
        Ok(Self { inner: tree.into() })
    }

    /// Create a tree from a wire payload JSON string
    #[staticmethod]
    fn from_payload(payload: &str) -> PyResult<Self> {
        let payload = parse_payload(payload)?;
        let tree = Tree::from_payload(payload.as_ref(), TreeConfig::default());
        Ok(Self { inner: tree.into() })
    }

    /// Add a leaf; returns its id, or None if `parent` is not a group
    #[pyo3(signature = (predicate, parent=None))]
    fn add(&self, predicate: &str, parent: Option<u64>) -> PyResult<Option<u64>> {
        let predicate: Predicate = from_json(predicate)?;
        Ok(self.inner.add(predicate, parent.map(NodeId)).map(|id| id.0))
    }

    /// Add an empty group; returns its id, or None if `parent` is not a group
    #[pyo3(signature = (operator="And", parent=None))]
    fn add_group(&self, operator: &str, parent: Option<u64>) -> PyResult<Option<u64>> {
        let operator = logical_operator(operator)?;
        Ok(self.inner.add_group(operator, parent.map(NodeId)).map(|id| id.0))
    }

    /// Patch a leaf from a partial JSON object
    fn update(&self, id: u64, patch: &str) -> PyResult<bool> {
        let patch: Value = from_json(patch)?;
        Ok(self.inner.mutate(|tree| tree.update_from_value(NodeId(id), &patch))?)
    }

    fn update_group_operator(&self, id: u64, operator: &str) -> PyResult<bool> {
        let operator = logical_operator(operator)?;
        Ok(self.inner.update_group_operator(NodeId(id), operator))
    }

    /// Remove a node; returns the removed subtree as JSON
    fn remove(&self, id: u64) -> PyResult<Option<String>> {
        let removed = self.inner.remove(NodeId(id));
        Ok(removed.as_ref().map(to_json).transpose()?)
    }

    /// Node with its id and subtree as JSON
    fn get(&self, id: u64) -> PyResult<Option<String>> {
        let node = self.inner.get(NodeId(id));
        Ok(node.as_ref().map(to_json).transpose()?)
    }

    fn clear(&self) {
        self.inner.clear();
    }

    fn set_root_operator(&self, operator: &str) -> PyResult<()> {
        self.inner.set_root_operator(logical_operator(operator)?);
        Ok(())
    }

    fn has_conditions(&self) -> bool {
        self.inner.has_conditions()
    }

    /// Id-free payload JSON, or None when the tree is empty
    fn payload(&self) -> PyResult<Option<String>> {
        Ok(payload_json(self.inner.payload().as_ref())?)
    }

    /// Request body `{"Filter": ..}`, or `{}` without a filter
    fn request_body(&self) -> PyResult<String> {
        let body = payload::request_body(self.inner.payload().as_ref());
        Ok(to_json(&body)?)
    }

    #[getter]
    fn revision(&self) -> u64 {
        self.inner.read(|tree| tree.revision())
    }

    fn __len__(&self) -> usize {
        self.inner.read(|tree| tree.node_count())
    }

    fn __repr__(&self) -> String {
        self.inner.read(|tree| {
            format!(
                "FilterTree(root_operator={}, nodes={}, revision={})",
                tree.root_operator(),
                tree.node_count(),
                tree.revision()
            )
        })
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Build an id-free payload from a JSON array of tree nodes
#[pyfunction]
#[pyo3(signature = (items, operator="And"))]
fn build_payload(items: &str, operator: &str) -> PyResult<Option<String>> {
    let operator = logical_operator(operator)?;
    let tree = Tree::from_seed_json(items, Some(operator), TreeConfig::default())?;
    Ok(payload_json(tree.payload().as_ref())?)
}

/// Validate a payload against field definitions; returns a JSON error list
#[pyfunction]
#[pyo3(signature = (payload, fields))]
fn validate_payload(payload: Option<&str>, fields: &str) -> PyResult<String> {
    let payload = match payload {
        Some(json) => parse_payload(json)?,
        None => None,
    };
    let fields = FieldDefinitions::from_json(fields)?;
    let errors = validate::validate_payload(payload.as_ref(), &fields);
    Ok(to_json(&errors)?)
}

/// Combine two optional payloads under `operator`
#[pyfunction]
#[pyo3(signature = (a, b, operator="And"))]
fn merge_payloads(a: Option<&str>, b: Option<&str>, operator: &str) -> PyResult<Option<String>> {
    let operator = logical_operator(operator)?;
    let a = a.map(parse_payload).transpose()?.flatten();
    let b = b.map(parse_payload).transpose()?.flatten();
    Ok(payload_json(payload::merge(a, b, operator).as_ref())?)
}

/// Structural equality of two optional payloads
#[pyfunction]
#[pyo3(signature = (a, b))]
fn payloads_equal(a: Option<&str>, b: Option<&str>) -> PyResult<bool> {
    let a = a.map(parse_payload).transpose()?.flatten();
    let b = b.map(parse_payload).transpose()?.flatten();
    Ok(payload::are_equal(a.as_ref(), b.as_ref()))
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn filter_tree_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(build_payload, m)?)?;
    m.add_function(wrap_pyfunction!(validate_payload, m)?)?;
    m.add_function(wrap_pyfunction!(merge_payloads, m)?)?;
    m.add_function(wrap_pyfunction!(payloads_equal, m)?)?;
    m.add_class::<PyFilterTree>()?;
    Ok(())
}
