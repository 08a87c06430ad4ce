//! Initial tree contents and partial leaf updates
//!
//! Seeds are what callers hand to a tree at construction: nodes that may
//! lack ids and, coming from foreign JSON, may lack leaf fields.

use crate::condition::{
    FilterNode, LogicalOperator, NodeId, Operator, Predicate, RhsType, RhsValue,
};
use crate::config::MalformedPolicy;
use crate::error::{FilterError, Result};
use crate::payload::PayloadNode;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Node supplied to seed a tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedNode {
    Group(SeedGroup),
    Condition(SeedCondition),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedGroup {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<NodeId>,
    pub operator: LogicalOperator,
    pub condition: Vec<SeedNode>,
}

/// Seed leaf; every field is optional so malformed input still decodes
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedCondition {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<NodeId>,
    pub lhs_field: Option<String>,
    pub operator: Option<String>,
    pub rhs_value: Option<Value>,
    pub rhs_type: Option<RhsType>,
}

/// Seed ids from foreign sources may be any JSON value; only non-negative
/// integers (or strings holding one) are kept, the rest get fresh ids
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let id = match &raw {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_u64().map(NodeId),
        Some(Value::String(s)) => s.parse().ok().map(NodeId),
        Some(_) => None,
    };
    if let (None, Some(raw)) = (id, raw.as_ref().filter(|v| !v.is_null())) {
        tracing::debug!(id = %raw, "unusable seed id ignored");
    }
    Ok(id)
}

impl SeedNode {
    /// Seed leaf without an id
    pub fn condition(predicate: Predicate) -> Self {
        SeedNode::Condition(SeedCondition::from_predicate(None, &predicate))
    }

    /// Seed group without an id
    pub fn group(operator: LogicalOperator, children: Vec<SeedNode>) -> Self {
        SeedNode::Group(SeedGroup {
            id: None,
            operator,
            condition: children,
        })
    }

    /// Same node carrying a caller-chosen id
    pub fn with_id(mut self, id: NodeId) -> Self {
        match &mut self {
            SeedNode::Group(g) => g.id = Some(id),
            SeedNode::Condition(c) => c.id = Some(id),
        }
        self
    }

    pub fn id(&self) -> Option<NodeId> {
        match self {
            SeedNode::Group(g) => g.id,
            SeedNode::Condition(c) => c.id,
        }
    }

    /// Parse a JSON array of seed nodes
    pub fn list_from_json(json: &str) -> Result<Vec<SeedNode>> {
        let json = json.trim();
        if json.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Predicate> for SeedNode {
    fn from(predicate: Predicate) -> Self {
        SeedNode::condition(predicate)
    }
}

/// Live nodes keep their ids when used as seeds
impl From<&FilterNode> for SeedNode {
    fn from(node: &FilterNode) -> Self {
        match node {
            FilterNode::Condition(c) => {
                SeedNode::Condition(SeedCondition::from_predicate(Some(c.id), &c.predicate))
            }
            FilterNode::Group(g) => SeedNode::Group(SeedGroup {
                id: Some(g.id),
                operator: g.operator,
                condition: g.children.iter().map(SeedNode::from).collect(),
            }),
        }
    }
}

impl From<&PayloadNode> for SeedNode {
    fn from(node: &PayloadNode) -> Self {
        match node {
            PayloadNode::Condition(p) => SeedNode::condition(p.clone()),
            PayloadNode::Group(g) => SeedNode::group(
                g.operator,
                g.condition.iter().map(SeedNode::from).collect(),
            ),
        }
    }
}

impl SeedCondition {
    fn from_predicate(id: Option<NodeId>, predicate: &Predicate) -> Self {
        let rhs_value = match &predicate.rhs_value {
            RhsValue::Absent => None,
            other => serde_json::to_value(other).ok(),
        };

        Self {
            id,
            lhs_field: Some(predicate.lhs_field.clone()),
            operator: Some(predicate.operator.as_str().to_string()),
            rhs_value,
            rhs_type: Some(predicate.rhs_type),
        }
    }

    /// Turn the seed into a predicate, applying `policy` when fields are
    /// missing or unreadable. `None` means the node is dropped.
    pub fn resolve(&self, policy: MalformedPolicy) -> Option<Predicate> {
        let operator = self.operator.as_deref().and_then(parse_operator);
        let rhs_value = operator.map(|op| RhsValue::from_json(op, self.rhs_value.as_ref()));

        match (&self.lhs_field, operator, rhs_value) {
            (Some(field), Some(operator), Some(Ok(rhs_value))) => Some(Predicate {
                lhs_field: field.clone(),
                operator,
                rhs_value,
                rhs_type: self.rhs_type.unwrap_or_default(),
            }),
            (field, operator, rhs_value) => match policy {
                MalformedPolicy::Drop => {
                    tracing::warn!(
                        id = ?self.id,
                        field = ?self.lhs_field,
                        operator = ?self.operator,
                        "dropping malformed seed condition"
                    );
                    None
                }
                MalformedPolicy::Fill => {
                    tracing::debug!(id = ?self.id, "filling malformed seed condition");
                    let operator = operator.unwrap_or(Operator::Eq);
                    let rhs_value = match rhs_value {
                        Some(Ok(v)) => v,
                        _ => RhsValue::from_json(operator, self.rhs_value.as_ref())
                            .unwrap_or_default(),
                    };
                    Some(Predicate {
                        lhs_field: field.clone().unwrap_or_default(),
                        operator,
                        rhs_value,
                        rhs_type: self.rhs_type.unwrap_or_default(),
                    })
                }
            },
        }
    }
}

fn parse_operator(name: &str) -> Option<Operator> {
    Operator::ALL.into_iter().find(|op| op.as_str() == name)
}

/// Partial update of a leaf; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionPatch {
    pub lhs_field: Option<String>,
    pub operator: Option<Operator>,
    pub rhs_value: Option<RhsValue>,
    pub rhs_type: Option<RhsType>,
}

impl ConditionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lhs_field(mut self, field: impl Into<String>) -> Self {
        self.lhs_field = Some(field.into());
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn rhs_value(mut self, value: impl Into<RhsValue>) -> Self {
        self.rhs_value = Some(value.into());
        self
    }

    pub fn rhs_type(mut self, rhs_type: RhsType) -> Self {
        self.rhs_type = Some(rhs_type);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lhs_field.is_none()
            && self.operator.is_none()
            && self.rhs_value.is_none()
            && self.rhs_type.is_none()
    }

    /// Decode a patch from a JSON object
    ///
    /// `rhsValue` is shaped by the patched operator when the patch carries
    /// one, otherwise by `current`. A present `"rhsValue": null` clears the
    /// operand; a missing key leaves it alone.
    pub fn from_value(value: &Value, current: Operator) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| FilterError::InvalidPayload("patch must be an object".to_string()))?;

        let operator = match map.get("operator") {
            Some(v) => Some(serde_json::from_value::<Operator>(v.clone())?),
            None => None,
        };
        let lhs_field = match map.get("lhsField") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(FilterError::InvalidPayload(format!(
                    "lhsField must be a string, got {}",
                    other
                )))
            }
            None => None,
        };
        let rhs_value = match map.get("rhsValue") {
            Some(v) => Some(RhsValue::from_json(operator.unwrap_or(current), Some(v))?),
            None => None,
        };
        let rhs_type = match map.get("rhsType") {
            Some(v) => Some(serde_json::from_value::<RhsType>(v.clone())?),
            None => None,
        };

        Ok(Self {
            lhs_field,
            operator,
            rhs_value,
            rhs_type,
        })
    }

    /// Write the given fields onto `predicate`
    ///
    /// The resulting operand is re-shaped for the resulting operator, so an
    /// `IN [1, 5]` leaf switched to `Between` holds the pair `[1, 5]`.
    pub fn apply(self, predicate: &mut Predicate) {
        if let Some(field) = self.lhs_field {
            predicate.lhs_field = field;
        }
        if let Some(operator) = self.operator {
            predicate.operator = operator;
        }
        if let Some(rhs_value) = self.rhs_value {
            predicate.rhs_value = rhs_value;
        }
        if let Some(rhs_type) = self.rhs_type {
            predicate.rhs_type = rhs_type;
        }
        predicate.rhs_value = std::mem::take(&mut predicate.rhs_value).shaped_for(predicate.operator);
    }
}
