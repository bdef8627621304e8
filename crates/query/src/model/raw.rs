//! Raw expression escape hatch

use serde_json::{Map, Value as JsonValue};

use crate::codec::{self, Structural};
use crate::error::QueryResult;
use crate::value::Value;

/// Literal expression text with optional positional bindings; opaque to the
/// model and passed through unvalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExpression {
    pub expression: String,
    pub bindings: Vec<Value>,
}

impl RawExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            bindings: Vec::new(),
        }
    }

    pub fn with_bindings<T: Into<Value>>(expression: impl Into<String>, bindings: Vec<T>) -> Self {
        Self {
            expression: expression.into(),
            bindings: bindings.into_iter().map(Into::into).collect(),
        }
    }
}

impl Structural for RawExpression {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("expression".into(), JsonValue::String(self.expression.clone()));
        if !self.bindings.is_empty() {
            obj.insert("bindings".into(), codec::values_to_structure(&self.bindings));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "raw expression")?;
        Ok(Self {
            expression: codec::required_str(obj, "expression", "raw expression")?,
            bindings: match obj.get("bindings") {
                Some(bindings) => codec::value_list(bindings, "raw expression")?,
                None => Vec::new(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_expression_structure() {
        assert_eq!(
            RawExpression::new("lower(email) = email").to_structure(),
            json!({"expression": "lower(email) = email"})
        );

        let bound = RawExpression::with_bindings("age > ? AND age < ?", vec![18, 65]);
        assert_eq!(bound.to_structure()["bindings"], json!([18, 65]));
        assert_eq!(RawExpression::from_structure(&bound.to_structure()).unwrap(), bound);
    }
}
