//! Correlated EXISTS subqueries

use serde_json::{Map, Value as JsonValue};

use super::types::Operator;
use crate::codec::{self, Structural};
use crate::error::QueryResult;
use crate::params::QueryParams;

/// Correlation between the outer query and the subquery table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left_field: String,
    pub operator: Operator,
    pub right_field: String,
}

impl JoinCondition {
    pub fn new(left_field: impl Into<String>, operator: Operator, right_field: impl Into<String>) -> Self {
        Self {
            left_field: left_field.into(),
            operator,
            right_field: right_field.into(),
        }
    }

    pub fn equals(left_field: impl Into<String>, right_field: impl Into<String>) -> Self {
        Self::new(left_field, Operator::Equal, right_field)
    }
}

impl Structural for JoinCondition {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("leftField".into(), JsonValue::String(self.left_field.clone()));
        obj.insert("operator".into(), self.operator.to_structure());
        obj.insert("rightField".into(), JsonValue::String(self.right_field.clone()));
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "join condition")?;
        Ok(Self {
            left_field: codec::required_str(obj, "leftField", "join condition")?,
            operator: Operator::from_structure(codec::required(obj, "operator", "join condition")?)?,
            right_field: codec::required_str(obj, "rightField", "join condition")?,
        })
    }
}

/// EXISTS (or NOT EXISTS) test against an independent subquery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubqueryCondition {
    pub table: String,
    pub query: QueryParams,
    pub on: Option<JoinCondition>,
    pub negated: bool,
}

impl SubqueryCondition {
    pub fn exists(table: impl Into<String>, query: QueryParams) -> Self {
        Self {
            table: table.into(),
            query,
            on: None,
            negated: false,
        }
    }

    pub fn not_exists(table: impl Into<String>, query: QueryParams) -> Self {
        Self {
            negated: true,
            ..Self::exists(table, query)
        }
    }

    pub fn joined_on(mut self, join: JoinCondition) -> Self {
        self.on = Some(join);
        self
    }
}

impl Structural for SubqueryCondition {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("table".into(), JsonValue::String(self.table.clone()));
        obj.insert("query".into(), self.query.to_structure());
        if let Some(on) = &self.on {
            obj.insert("on".into(), on.to_structure());
        }
        if self.negated {
            obj.insert("negated".into(), JsonValue::Bool(true));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "subquery condition")?;
        Ok(Self {
            table: codec::required_str(obj, "table", "subquery condition")?,
            query: QueryParams::from_structure(codec::required(obj, "query", "subquery condition")?)?,
            on: codec::optional_of(obj, "on")?,
            negated: codec::optional_bool(obj, "negated", "subquery condition")?.unwrap_or(false),
        })
    }
}
