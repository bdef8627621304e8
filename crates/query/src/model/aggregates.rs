//! Aggregation specs

use serde_json::{Map, Value as JsonValue};

use super::types::AggregateFunction;
use crate::codec::{self, Structural};
use crate::error::QueryResult;

/// Aggregation over a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    pub field: String,
    pub alias: Option<String>,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, field: impl Into<String>) -> Self {
        Self {
            function,
            field: field.into(),
            alias: None,
        }
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Count, field)
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Sum, field)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Avg, field)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Min, field)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::new(AggregateFunction::Max, field)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Column name the aggregate produces: the alias, or `function_field`
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}_{}", self.function, self.field),
        }
    }
}

impl Structural for AggregateSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("type".into(), self.function.to_structure());
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        if let Some(alias) = &self.alias {
            obj.insert("alias".into(), JsonValue::String(alias.clone()));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "aggregate spec")?;
        Ok(Self {
            function: AggregateFunction::from_structure(codec::required(obj, "type", "aggregate spec")?)?,
            field: codec::required_str(obj, "field", "aggregate spec")?,
            alias: codec::optional_str(obj, "alias", "aggregate spec")?,
        })
    }
}
