//! Configuration structures
//!
//! This module holds the tree options and the field-definition registry the
//! validator checks payloads against. Both deserialize from JSON.

mod field;

pub use field::*;

use crate::condition::LogicalOperator;
use crate::error::{FilterError, Result};
use serde::Deserialize;

/// What to do with a seed condition that is missing required leaf fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Skip the node (and log a warning)
    #[default]
    Drop,
    /// Keep the node, filling a blank field name and `EQ`
    Fill,
}

/// Options for a filter tree instance
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    /// Root combinator for trees created without an explicit one
    pub default_root_operator: LogicalOperator,
    pub malformed_seeds: MalformedPolicy,
}

impl TreeConfig {
    pub fn with_root_operator(mut self, operator: LogicalOperator) -> Self {
        self.default_root_operator = operator;
        self
    }

    pub fn with_malformed_seeds(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_seeds = policy;
        self
    }
}

/// Load tree options from JSON; missing keys take their defaults
pub fn load_tree_config(json: &str) -> Result<TreeConfig> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(TreeConfig::default());
    }

    serde_json::from_str(json).map_err(|e| FilterError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::default();
        assert_eq!(config.default_root_operator, LogicalOperator::And);
        assert_eq!(config.malformed_seeds, MalformedPolicy::Drop);
        assert_eq!(load_tree_config("").unwrap(), config);
        assert_eq!(load_tree_config("{}").unwrap(), config);
    }

    #[test]
    fn test_load_partial_config() {
        let config = load_tree_config(r#"{"defaultRootOperator": "Or"}"#).unwrap();
        assert_eq!(config.default_root_operator, LogicalOperator::Or);
        assert_eq!(config.malformed_seeds, MalformedPolicy::Drop);

        let config = load_tree_config(r#"{"malformedSeeds": "fill"}"#).unwrap();
        assert_eq!(config.malformed_seeds, MalformedPolicy::Fill);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            load_tree_config(r#"{"defaultRootOperator": "Xor"}"#),
            Err(FilterError::InvalidConfig(_))
        ));
    }
}
