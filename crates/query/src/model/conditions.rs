//! Filter clauses: predicates, ranges, set membership, nullness and having

use serde_json::{Map, Value as JsonValue};

use super::types::{Combinator, Operator};
use crate::codec::{self, Structural};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Explicit operator comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    /// `None` only for is-null / is-not-null; `Some(Value::Null)` is an
    /// explicit null comparison value
    pub value: Option<Value>,
    /// How this predicate joins the one before it
    pub combinator: Option<Combinator>,
}

impl Predicate {
    /// Create a predicate; the value is dropped for operators that take none
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        let value = operator.requires_value().then(|| value.into());
        Self {
            field: field.into(),
            operator,
            value,
            combinator: None,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Equal, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNull, Value::Null)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotNull, Value::Null)
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = Some(combinator);
        self
    }
}

impl Structural for Predicate {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("operator".into(), self.operator.to_structure());
        if let Some(value) = &self.value {
            obj.insert("value".into(), value.to_json());
        }
        if let Some(combinator) = &self.combinator {
            obj.insert("combinator".into(), combinator.to_structure());
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "predicate")?;
        let operator = Operator::from_structure(codec::required(obj, "operator", "predicate")?)?;
        let value = obj.get("value").map(Value::from_json);
        if value.is_none() && operator.requires_value() {
            return Err(QueryError::missing_key("predicate", "value"));
        }
        Ok(Self {
            field: codec::required_str(obj, "field", "predicate")?,
            operator,
            value,
            combinator: codec::optional_of(obj, "combinator")?,
        })
    }
}

/// Inclusive two-bound range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeClause {
    pub field: String,
    pub bounds: [Value; 2],
}

impl RangeClause {
    pub fn new(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            bounds: [low.into(), high.into()],
        }
    }

    pub fn low(&self) -> &Value {
        &self.bounds[0]
    }

    pub fn high(&self) -> &Value {
        &self.bounds[1]
    }
}

impl Structural for RangeClause {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("value".into(), codec::values_to_structure(&self.bounds));
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "range clause")?;
        let raw = codec::required(obj, "value", "range clause")?;
        let bounds: [Value; 2] = codec::value_list(raw, "range clause")?
            .try_into()
            .map_err(|_| QueryError::wrong_type("range clause", "exactly two bounds", raw))?;
        Ok(Self {
            field: codec::required_str(obj, "field", "range clause")?,
            bounds,
        })
    }
}

/// Set membership test; used for both `in` and `not in` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetClause {
    pub field: String,
    pub values: Vec<Value>,
}

impl SetClause {
    pub fn new<T: Into<Value>>(field: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Structural for SetClause {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("value".into(), codec::values_to_structure(&self.values));
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "set clause")?;
        Ok(Self {
            field: codec::required_str(obj, "field", "set clause")?,
            values: codec::value_list(codec::required(obj, "value", "set clause")?, "set clause")?,
        })
    }
}

/// Null presence test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullnessClause {
    pub field: String,
    pub is_null: bool,
}

impl NullnessClause {
    pub fn null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            is_null: true,
        }
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            is_null: false,
        }
    }
}

impl Structural for NullnessClause {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("isNull".into(), JsonValue::Bool(self.is_null));
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "nullness clause")?;
        let is_null = codec::optional_bool(obj, "isNull", "nullness clause")?
            .ok_or_else(|| QueryError::missing_key("nullness clause", "isNull"))?;
        Ok(Self {
            field: codec::required_str(obj, "field", "nullness clause")?,
            is_null,
        })
    }
}

/// Post-aggregation predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HavingClause {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl HavingClause {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl Structural for HavingClause {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("operator".into(), self.operator.to_structure());
        obj.insert("value".into(), self.value.to_json());
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "having clause")?;
        Ok(Self {
            field: codec::required_str(obj, "field", "having clause")?,
            operator: Operator::from_structure(codec::required(obj, "operator", "having clause")?)?,
            value: obj.get("value").map(Value::from_json).unwrap_or_default(),
        })
    }
}
