//! Operators, operands and predicates for filter conditions

use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operators for leaf conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (EQ)
    #[serde(rename = "EQ")]
    Eq,
    /// Not equal (NE)
    #[serde(rename = "NE")]
    Ne,
    /// Greater than (GT)
    #[serde(rename = "GT")]
    Gt,
    /// Greater than or equal (GTE)
    #[serde(rename = "GTE")]
    Gte,
    /// Less than (LT)
    #[serde(rename = "LT")]
    Lt,
    /// Less than or equal (LTE)
    #[serde(rename = "LTE")]
    Lte,
    /// Substring or element containment
    Contains,
    /// Negated containment
    NotContains,
    /// Membership in a list (IN)
    #[serde(rename = "IN")]
    In,
    /// Non-membership in a list (NIN)
    #[serde(rename = "NIN")]
    Nin,
    /// Inclusive range
    Between,
    /// Outside an inclusive range
    NotBetween,
    /// Field is missing, null or empty
    Empty,
    /// Field has a value
    NotEmpty,
}

impl Operator {
    /// Every operator, in wire declaration order
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::NotContains,
        Operator::In,
        Operator::Nin,
        Operator::Between,
        Operator::NotBetween,
        Operator::Empty,
        Operator::NotEmpty,
    ];

    /// Wire name of the operator
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Gt => "GT",
            Operator::Gte => "GTE",
            Operator::Lt => "LT",
            Operator::Lte => "LTE",
            Operator::Contains => "Contains",
            Operator::NotContains => "NotContains",
            Operator::In => "IN",
            Operator::Nin => "NIN",
            Operator::Between => "Between",
            Operator::NotBetween => "NotBetween",
            Operator::Empty => "Empty",
            Operator::NotEmpty => "NotEmpty",
        }
    }

    /// Shape of `rhsValue` this operator expects
    pub fn operand_shape(self) -> OperandShape {
        match self {
            Operator::Empty | Operator::NotEmpty => OperandShape::None,
            Operator::Between | Operator::NotBetween => OperandShape::Pair,
            Operator::In | Operator::Nin => OperandShape::List,
            _ => OperandShape::Scalar,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical combinators for condition groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    /// Negates the conjunction of its children (usually exactly one)
    Not,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "And",
            LogicalOperator::Or => "Or",
            LogicalOperator::Not => "Not",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the operand is a literal or names another field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RhsType {
    #[default]
    Constant,
    Field,
}

impl RhsType {
    pub fn is_constant(&self) -> bool {
        matches!(self, RhsType::Constant)
    }
}

/// Expected operand shape for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// No operand (Empty / NotEmpty)
    None,
    Scalar,
    /// Exactly two elements (Between / NotBetween)
    Pair,
    /// Non-empty list (IN / NIN)
    List,
}

impl fmt::Display for OperandShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperandShape::None => "no value",
            OperandShape::Scalar => "a single value",
            OperandShape::Pair => "exactly two values",
            OperandShape::List => "a non-empty list",
        };
        f.write_str(name)
    }
}

/// Scalar operand value
///
/// `Int` and `Float` compare equal when they hold the same number.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Convert a JSON value, `None` for null, arrays and objects
    ///
    /// Integers beyond the `i64` range come back as `Float` and lose
    /// precision. Operands never take that path: [`RhsValue::from_json`]
    /// rejects them.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => Value::from(*f),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// Human readable kind used in validation messages
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "boolean",
            Scalar::Int(_) | Scalar::Float(_) => "number",
            Scalar::String(_) => "string",
        }
    }

    /// Ordering between comparable scalars (numbers, strings, booleans)
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Operand of a leaf condition, shaped by its operator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RhsValue {
    /// No operand; also what a JSON `null` or a missing key decodes to
    #[default]
    Absent,
    Scalar(Scalar),
    Pair([Scalar; 2]),
    List(Vec<Scalar>),
}

impl RhsValue {
    pub fn pair(low: impl Into<Scalar>, high: impl Into<Scalar>) -> Self {
        RhsValue::Pair([low.into(), high.into()])
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        RhsValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Decode a wire operand for `operator`
    ///
    /// Arrays become `Pair` only when the operator expects a pair and the
    /// array has exactly two elements. Every other shape mismatch is kept as
    /// is and left to the validator.
    pub fn from_json(operator: Operator, value: Option<&Value>) -> Result<RhsValue> {
        let value = match value {
            None | Some(Value::Null) => return Ok(RhsValue::Absent),
            Some(v) => v,
        };

        match value {
            Value::Array(items) => {
                let scalars = items
                    .iter()
                    .map(|item| match item {
                        Value::Array(_) | Value::Object(_) | Value::Null => {
                            Err(FilterError::InvalidOperand(format!(
                                "array element {} is not a scalar",
                                item
                            )))
                        }
                        other => operand_scalar(other),
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(RhsValue::List(scalars).shaped_for(operator))
            }
            Value::Object(_) => Err(FilterError::InvalidOperand(format!(
                "object operand for {} is not supported",
                operator
            ))),
            other => operand_scalar(other).map(RhsValue::Scalar),
        }
    }

    /// Same operand, re-shaped for `operator`
    ///
    /// A two-element list becomes a `Pair` for range operators and a `Pair`
    /// becomes a list for every other operator, so one wire array always has
    /// one in-memory form. Other mismatches are left to the validator.
    pub fn shaped_for(self, operator: Operator) -> RhsValue {
        let wants_pair = operator.operand_shape() == OperandShape::Pair;
        match self {
            RhsValue::List(items) if wants_pair => match <[Scalar; 2]>::try_from(items) {
                Ok(pair) => RhsValue::Pair(pair),
                Err(items) => RhsValue::List(items),
            },
            RhsValue::Pair(pair) if !wants_pair => RhsValue::List(pair.into()),
            other => other,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, RhsValue::Absent)
    }

    /// Shape this operand actually has
    pub fn shape(&self) -> OperandShape {
        match self {
            RhsValue::Absent => OperandShape::None,
            RhsValue::Scalar(_) => OperandShape::Scalar,
            RhsValue::Pair(_) => OperandShape::Pair,
            RhsValue::List(_) => OperandShape::List,
        }
    }

    /// All scalar elements, in order
    pub fn as_slice(&self) -> &[Scalar] {
        match self {
            RhsValue::Absent => &[],
            RhsValue::Scalar(s) => std::slice::from_ref(s),
            RhsValue::Pair(pair) => &pair[..],
            RhsValue::List(items) => items,
        }
    }
}

/// Scalar operand from JSON; integers must fit in `i64`
fn operand_scalar(value: &Value) -> Result<Scalar> {
    if let Value::Number(n) = value {
        if n.is_u64() && n.as_i64().is_none() {
            return Err(FilterError::InvalidOperand(format!(
                "integer {} is out of range",
                n
            )));
        }
    }
    Scalar::from_json(value).ok_or_else(|| FilterError::InvalidOperand(value.to_string()))
}

impl From<Scalar> for RhsValue {
    fn from(value: Scalar) -> Self {
        RhsValue::Scalar(value)
    }
}

macro_rules! rhs_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RhsValue {
                fn from(value: $ty) -> Self {
                    RhsValue::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

rhs_from_scalar!(bool, i32, i64, f64, &str, String);

impl Serialize for RhsValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RhsValue::Absent => serializer.serialize_none(),
            RhsValue::Scalar(s) => s.serialize(serializer),
            RhsValue::Pair(pair) => pair.serialize(serializer),
            RhsValue::List(items) => items.serialize(serializer),
        }
    }
}

/// The id-less fields of a leaf condition
///
/// This is both the wire form of a leaf and the content of a live tree leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WirePredicate")]
pub struct Predicate {
    pub lhs_field: String,
    pub operator: Operator,
    #[serde(skip_serializing_if = "RhsValue::is_absent")]
    pub rhs_value: RhsValue,
    #[serde(skip_serializing_if = "RhsType::is_constant")]
    pub rhs_type: RhsType,
}

impl Predicate {
    pub fn new(lhs_field: impl Into<String>, operator: Operator, rhs_value: impl Into<RhsValue>) -> Self {
        Self {
            lhs_field: lhs_field.into(),
            operator,
            rhs_value: rhs_value.into().shaped_for(operator),
            rhs_type: RhsType::Constant,
        }
    }

    /// Predicate without an operand, for `Empty` / `NotEmpty`
    pub fn unary(lhs_field: impl Into<String>, operator: Operator) -> Self {
        Self::new(lhs_field, operator, RhsValue::Absent)
    }

    /// Compare `lhs_field` against another field instead of a constant
    pub fn against_field(
        lhs_field: impl Into<String>,
        operator: Operator,
        rhs_field: impl Into<String>,
    ) -> Self {
        Self {
            lhs_field: lhs_field.into(),
            operator,
            rhs_value: RhsValue::Scalar(Scalar::String(rhs_field.into())),
            rhs_type: RhsType::Field,
        }
    }
}

/// Raw wire leaf, before the operand is shaped by its operator
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePredicate {
    lhs_field: String,
    operator: Operator,
    #[serde(default)]
    rhs_value: Option<Value>,
    #[serde(default)]
    rhs_type: Option<RhsType>,
}

impl TryFrom<WirePredicate> for Predicate {
    type Error = FilterError;

    fn try_from(wire: WirePredicate) -> Result<Self> {
        let rhs_value = RhsValue::from_json(wire.operator, wire.rhs_value.as_ref())?;
        Ok(Predicate {
            lhs_field: wire.lhs_field,
            operator: wire.operator,
            rhs_value,
            rhs_type: wire.rhs_type.unwrap_or_default(),
        })
    }
}
