//! Field definitions used by the payload validator

use crate::condition::{Operator, Scalar};
use crate::error::Result;
use ahash::AHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Currency,
    Boolean,
    Date,
    Select,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Select => "select",
        }
    }

    /// Operators a field of this type accepts when none are declared
    pub fn default_operators(self) -> &'static [Operator] {
        use Operator::*;

        match self {
            FieldType::String => &[Eq, Ne, Contains, NotContains, In, Nin, Empty, NotEmpty],
            FieldType::Number | FieldType::Currency => &[
                Eq, Ne, Gt, Gte, Lt, Lte, In, Nin, Between, NotBetween, Empty, NotEmpty,
            ],
            FieldType::Boolean => &[Eq, Ne, Empty, NotEmpty],
            FieldType::Date => &[Eq, Ne, Gt, Gte, Lt, Lte, Between, NotBetween, Empty, NotEmpty],
            FieldType::Select => &[Eq, Ne, In, Nin, Empty, NotEmpty],
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of one filterable field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub allowed_operators: Option<Vec<Operator>>,
    #[serde(default, deserialize_with = "deserialize_options")]
    pub select_options: Option<Vec<Scalar>>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            allowed_operators: None,
            select_options: None,
        }
    }

    pub fn with_operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.allowed_operators = Some(operators.into_iter().collect());
        self
    }

    pub fn with_options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        self.select_options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Declared operators, or the type defaults when none were declared
    pub fn operators(&self) -> &[Operator] {
        match &self.allowed_operators {
            Some(ops) => ops,
            None => self.field_type.default_operators(),
        }
    }

    #[inline]
    pub fn allows(&self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }
}

fn deserialize_options<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Scalar>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    raw.map(|values| {
        values
            .iter()
            .map(|v| {
                Scalar::from_json(v).ok_or_else(|| {
                    serde::de::Error::custom(format!("select option {} is not a scalar", v))
                })
            })
            .collect()
    })
    .transpose()
}

/// Registry of field definitions keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldDefinitions {
    fields: AHashMap<String, FieldDefinition>,
}

impl FieldDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a JSON object `{ fieldName: { type, .. } }`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: FieldDefinition) {
        self.fields.insert(name.into(), definition);
    }

    /// Builder form of `insert`
    pub fn with(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_definitions_from_json() {
        let defs = FieldDefinitions::from_json(
            r#"{
                "price": {"type": "currency", "allowedOperators": ["EQ", "Between"]},
                "status": {"type": "select", "selectOptions": ["open", "done", 3]},
                "title": {"type": "string"}
            }"#,
        )
        .unwrap();

        assert_eq!(defs.len(), 3);

        let price = defs.get("price").unwrap();
        assert_eq!(price.field_type, FieldType::Currency);
        assert!(price.allows(Operator::Between));
        assert!(!price.allows(Operator::Gt));

        let status = defs.get("status").unwrap();
        assert_eq!(
            status.select_options.as_deref(),
            Some(&[Scalar::from("open"), Scalar::from("done"), Scalar::Int(3)][..])
        );

        // No declared operators falls back to the type defaults
        let title = defs.get("title").unwrap();
        assert!(title.allows(Operator::Contains));
        assert!(!title.allows(Operator::Between));
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        assert!(FieldDefinitions::from_json(r#"{"x": {"type": "blob"}}"#).is_err());
    }

    #[test]
    fn test_default_operators_per_type() {
        assert!(FieldType::Boolean.default_operators().contains(&Operator::Eq));
        assert!(!FieldType::Boolean.default_operators().contains(&Operator::Gt));
        assert!(FieldType::Date.default_operators().contains(&Operator::Between));
        assert!(!FieldType::Currency.default_operators().contains(&Operator::Contains));
    }
}
