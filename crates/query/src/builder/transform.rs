//! Query Builder result transforms, raw expressions and EXPLAIN

use super::{push, QueryBuilder};
use crate::model::{AggregateSpec, ExplainOptions, PivotSpec, RawExpression, TransformSpec};
use crate::value::Value;

impl QueryBuilder {
    /// Set the result transform, replacing any earlier one
    pub fn transform(mut self, spec: TransformSpec) -> Self {
        if self.params.transform.is_some() {
            tracing::debug!("Replacing existing transform on '{}'", self.table);
        }
        self.params.transform = Some(spec);
        self
    }

    /// Pivot shorthand; replaces the whole transform
    pub fn pivot<T: Into<Value>>(self, column: &str, values: Vec<T>, aggregate: AggregateSpec) -> Self {
        self.transform(TransformSpec::new().pivot(PivotSpec::new(column, values, aggregate)))
    }

    /// Computed-fields shorthand; replaces the whole transform
    pub fn compute<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let spec = fields
            .into_iter()
            .fold(TransformSpec::new(), |spec, (name, expression)| spec.compute(name, expression));
        self.transform(spec)
    }

    /// Raw expression passed to the executor verbatim
    pub fn raw(mut self, expression: impl Into<String>) -> Self {
        push(&mut self.params.raw, RawExpression::new(expression));
        self
    }

    pub fn raw_with_bindings<T: Into<Value>>(mut self, expression: impl Into<String>, bindings: Vec<T>) -> Self {
        push(&mut self.params.raw, RawExpression::with_bindings(expression, bindings));
        self
    }

    pub fn explain(mut self, options: ExplainOptions) -> Self {
        self.params.explain = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Structural;
    use crate::model::ExplainFormat;
    use serde_json::json;

    #[test]
    fn test_pivot_then_compute_replaces() {
        let params = QueryBuilder::new("sales")
            .pivot("quarter", vec!["Q1", "Q2"], AggregateSpec::sum("amount"))
            .compute([("margin", "revenue - cost")])
            .to_params();

        let transform = params.transform.unwrap();
        assert!(transform.pivot.is_none());
        assert_eq!(transform.compute.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_pivot_shape() {
        let params = QueryBuilder::new("sales")
            .pivot("quarter", vec!["Q1", "Q2"], AggregateSpec::sum("amount"))
            .to_params();
        assert_eq!(
            params.to_structure(),
            json!({
                "transform": {
                    "pivot": {
                        "column": "quarter",
                        "values": ["Q1", "Q2"],
                        "aggregate": {"type": "sum", "field": "amount"},
                    }
                }
            })
        );
    }

    #[test]
    fn test_transform_sets_full_spec() {
        let spec = TransformSpec::new().group_by(&["region"]).flatten(true).select(&["region", "total"]);
        let params = QueryBuilder::new("sales").transform(spec.clone()).to_params();
        assert_eq!(params.transform, Some(spec));
    }

    #[test]
    fn test_raw_expressions_append() {
        let params = QueryBuilder::new("t")
            .raw("score > avg_score")
            .raw_with_bindings("created_at > ?", vec!["2024-01-01"])
            .to_params();
        assert_eq!(
            params.to_structure()["raw"],
            json!([
                {"expression": "score > avg_score"},
                {"expression": "created_at > ?", "bindings": ["2024-01-01"]},
            ])
        );
    }

    #[test]
    fn test_explain_options() {
        let params = QueryBuilder::new("t")
            .explain(ExplainOptions::new().analyze(true).format(ExplainFormat::Json))
            .to_params();
        assert_eq!(params.to_structure()["explain"], json!({"analyze": true, "format": "json"}));
    }
}
