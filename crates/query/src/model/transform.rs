//! Post-fetch result reshaping

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::aggregates::AggregateSpec;
use crate::codec::{self, Structural};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Pivot of one column's values into output columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotSpec {
    pub column: String,
    pub values: Vec<Value>,
    pub aggregate: AggregateSpec,
}

impl PivotSpec {
    pub fn new<T: Into<Value>>(column: impl Into<String>, values: Vec<T>, aggregate: AggregateSpec) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            aggregate,
        }
    }
}

impl Structural for PivotSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("column".into(), JsonValue::String(self.column.clone()));
        obj.insert("values".into(), codec::values_to_structure(&self.values));
        obj.insert("aggregate".into(), self.aggregate.to_structure());
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "pivot spec")?;
        Ok(Self {
            column: codec::required_str(obj, "column", "pivot spec")?,
            values: codec::value_list(codec::required(obj, "values", "pivot spec")?, "pivot spec")?,
            aggregate: AggregateSpec::from_structure(codec::required(obj, "aggregate", "pivot spec")?)?,
        })
    }
}

/// Result transform applied by the executor after rows are fetched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformSpec {
    pub group_by: Option<Vec<String>>,
    pub pivot: Option<PivotSpec>,
    pub flatten: Option<bool>,
    pub select: Option<Vec<String>>,
    /// Computed output fields: name -> expression text
    pub compute: Option<BTreeMap<String, String>>,
}

impl TransformSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.group_by = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn pivot(mut self, pivot: PivotSpec) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = Some(flatten);
        self
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn compute(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.compute
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), expression.into());
        self
    }
}

impl Structural for TransformSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        if let Some(group_by) = &self.group_by {
            obj.insert("groupBy".into(), codec::strings_to_structure(group_by));
        }
        if let Some(pivot) = &self.pivot {
            obj.insert("pivot".into(), pivot.to_structure());
        }
        if let Some(flatten) = self.flatten {
            obj.insert("flatten".into(), JsonValue::Bool(flatten));
        }
        if let Some(select) = &self.select {
            obj.insert("select".into(), codec::strings_to_structure(select));
        }
        if let Some(compute) = &self.compute {
            obj.insert(
                "compute".into(),
                JsonValue::Object(
                    compute
                        .iter()
                        .map(|(name, expr)| (name.clone(), JsonValue::String(expr.clone())))
                        .collect(),
                ),
            );
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let context = "transform spec";
        let obj = codec::as_object(value, context)?;
        let compute = match obj.get("compute") {
            None => None,
            Some(raw) => Some(
                codec::as_object(raw, context)?
                    .iter()
                    .map(|(name, expr)| {
                        expr.as_str()
                            .map(|e| (name.clone(), e.to_string()))
                            .ok_or_else(|| QueryError::wrong_type(context, "an expression string", expr))
                    })
                    .collect::<QueryResult<BTreeMap<_, _>>>()?,
            ),
        };
        Ok(Self {
            group_by: codec::optional_string_list(obj, "groupBy", context)?,
            pivot: codec::optional_of(obj, "pivot")?,
            flatten: codec::optional_bool(obj, "flatten", context)?,
            select: codec::optional_string_list(obj, "select", context)?,
            compute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_transform_is_empty_mapping() {
        assert_eq!(TransformSpec::new().to_structure(), json!({}));
    }

    #[test]
    fn test_full_transform_round_trip() {
        let spec = TransformSpec::new()
            .group_by(&["region"])
            .pivot(PivotSpec::new("quarter", vec!["Q1", "Q2"], AggregateSpec::sum("revenue")))
            .flatten(true)
            .select(&["region", "Q1", "Q2"])
            .compute("growth", "Q2 - Q1");

        let structure = spec.to_structure();
        assert_eq!(structure["pivot"]["aggregate"], json!({"type": "sum", "field": "revenue"}));
        assert_eq!(structure["compute"], json!({"growth": "Q2 - Q1"}));
        assert_eq!(TransformSpec::from_structure(&structure).unwrap(), spec);
    }

    #[test]
    fn test_pivot_requires_aggregate() {
        let err = PivotSpec::from_structure(&json!({"column": "q", "values": []})).unwrap_err();
        assert_eq!(err.value(), Some("aggregate"));
    }
}
