//! Query Parameter Aggregate - the complete, serializable description of one
//! query

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::codec::{self, Structural};
use crate::error::QueryResult;
use crate::model::{
    AdvancedWindowSpec, AggregateSpec, BooleanGroup, Cte, ExplainOptions, HavingClause, NullnessClause,
    OrderSpec, Predicate, RangeClause, RawExpression, RecursiveCte, SetClause, SubqueryCondition,
    TransformSpec, WindowSpec,
};
use crate::value::Value;

/// One optional slot per clause category plus the scalar options.
///
/// No slot combination is rejected here; cross-slot consistency (having
/// without group-by and so on) is left to the remote executor. `Some(empty)`
/// and `None` are distinct and both survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    /// Implicit field = value filters
    pub filter: Option<BTreeMap<String, Value>>,
    /// Explicit operator predicates
    pub where_raw: Option<Vec<Predicate>>,
    pub where_between: Option<Vec<RangeClause>>,
    pub where_in: Option<Vec<SetClause>>,
    pub where_not_in: Option<Vec<SetClause>>,
    pub where_null: Option<Vec<NullnessClause>>,
    pub where_exists: Option<Vec<SubqueryCondition>>,
    pub where_groups: Option<Vec<BooleanGroup>>,
    pub order_by: Option<Vec<OrderSpec>>,
    pub group_by: Option<Vec<String>>,
    pub having: Option<Vec<HavingClause>>,
    pub aggregates: Option<Vec<AggregateSpec>>,
    pub windows: Option<Vec<WindowSpec>>,
    pub advanced_windows: Option<Vec<AdvancedWindowSpec>>,
    pub with: Option<Vec<Cte>>,
    pub with_recursive: Option<Vec<RecursiveCte>>,
    pub raw: Option<Vec<RawExpression>>,
    pub transform: Option<TransformSpec>,
    pub select: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub explain: Option<ExplainOptions>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no slot is populated
    pub fn is_empty(&self) -> bool {
        self.populated_slots().is_empty()
    }

    /// Wire keys of every populated slot
    pub fn populated_slots(&self) -> Vec<&'static str> {
        match self.to_structure() {
            JsonValue::Object(obj) => SLOT_KEYS
                .iter()
                .copied()
                .filter(|key| obj.contains_key(*key))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Equality filters expressed as `=` predicates followed by the explicit
    /// predicates: the evaluation-level view of the two filter slots
    pub fn effective_predicates(&self) -> Vec<Predicate> {
        let mut predicates: Vec<Predicate> = self
            .filter
            .iter()
            .flatten()
            .map(|(field, value)| Predicate::eq(field.clone(), value.clone()))
            .collect();
        predicates.extend(self.where_raw.iter().flatten().cloned());
        predicates
    }
}

/// Wire keys of the clause and scalar slots
pub const SLOT_KEYS: [&str; 22] = [
    "filter",
    "whereRaw",
    "whereBetween",
    "whereIn",
    "whereNotIn",
    "whereNull",
    "whereExists",
    "whereGroups",
    "orderBy",
    "groupBy",
    "having",
    "aggregates",
    "windows",
    "advancedWindows",
    "with",
    "withRecursive",
    "raw",
    "transform",
    "select",
    "limit",
    "offset",
    "explain",
];

fn put_list<T: Structural>(obj: &mut Map<String, JsonValue>, key: &str, items: &Option<Vec<T>>) {
    if let Some(items) = items {
        obj.insert(key.into(), codec::list_to_structure(items));
    }
}

impl Structural for QueryParams {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        if let Some(filter) = &self.filter {
            obj.insert("filter".into(), codec::value_map_to_structure(filter));
        }
        put_list(&mut obj, "whereRaw", &self.where_raw);
        put_list(&mut obj, "whereBetween", &self.where_between);
        put_list(&mut obj, "whereIn", &self.where_in);
        put_list(&mut obj, "whereNotIn", &self.where_not_in);
        put_list(&mut obj, "whereNull", &self.where_null);
        put_list(&mut obj, "whereExists", &self.where_exists);
        put_list(&mut obj, "whereGroups", &self.where_groups);
        put_list(&mut obj, "orderBy", &self.order_by);
        if let Some(group_by) = &self.group_by {
            obj.insert("groupBy".into(), codec::strings_to_structure(group_by));
        }
        put_list(&mut obj, "having", &self.having);
        put_list(&mut obj, "aggregates", &self.aggregates);
        put_list(&mut obj, "windows", &self.windows);
        put_list(&mut obj, "advancedWindows", &self.advanced_windows);
        put_list(&mut obj, "with", &self.with);
        put_list(&mut obj, "withRecursive", &self.with_recursive);
        put_list(&mut obj, "raw", &self.raw);
        if let Some(transform) = &self.transform {
            obj.insert("transform".into(), transform.to_structure());
        }
        if let Some(select) = &self.select {
            obj.insert("select".into(), codec::strings_to_structure(select));
        }
        if let Some(limit) = self.limit {
            obj.insert("limit".into(), JsonValue::from(limit));
        }
        if let Some(offset) = self.offset {
            obj.insert("offset".into(), JsonValue::from(offset));
        }
        if let Some(explain) = &self.explain {
            obj.insert("explain".into(), explain.to_structure());
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let context = "query params";
        let obj = codec::as_object(value, context)?;
        Ok(Self {
            filter: obj.get("filter").map(|f| codec::value_map(f, context)).transpose()?,
            where_raw: codec::optional_list_of(obj, "whereRaw", context)?,
            where_between: codec::optional_list_of(obj, "whereBetween", context)?,
            where_in: codec::optional_list_of(obj, "whereIn", context)?,
            where_not_in: codec::optional_list_of(obj, "whereNotIn", context)?,
            where_null: codec::optional_list_of(obj, "whereNull", context)?,
            where_exists: codec::optional_list_of(obj, "whereExists", context)?,
            where_groups: codec::optional_list_of(obj, "whereGroups", context)?,
            order_by: codec::optional_list_of(obj, "orderBy", context)?,
            group_by: codec::optional_string_list(obj, "groupBy", context)?,
            having: codec::optional_list_of(obj, "having", context)?,
            aggregates: codec::optional_list_of(obj, "aggregates", context)?,
            windows: codec::optional_list_of(obj, "windows", context)?,
            advanced_windows: codec::optional_list_of(obj, "advancedWindows", context)?,
            with: codec::optional_list_of(obj, "with", context)?,
            with_recursive: codec::optional_list_of(obj, "withRecursive", context)?,
            raw: codec::optional_list_of(obj, "raw", context)?,
            transform: codec::optional_of(obj, "transform")?,
            select: codec::optional_string_list(obj, "select", context)?,
            limit: codec::optional_u64(obj, "limit", context)?,
            offset: codec::optional_u64(obj, "offset", context)?,
            explain: codec::optional_of(obj, "explain")?,
        })
    }
}

/// Serialize params into their structural form
pub fn serialize(params: &QueryParams) -> JsonValue {
    params.to_structure()
}

/// Rebuild params from their structural form
pub fn deserialize(value: &JsonValue) -> QueryResult<QueryParams> {
    QueryParams::from_structure(value)
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_structure().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        QueryParams::from_structure(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;
    use serde_json::json;

    #[test]
    fn test_empty_params() {
        let params = QueryParams::new();
        assert!(params.is_empty());
        assert_eq!(params.to_structure(), json!({}));
        assert_eq!(QueryParams::from_structure(&json!({})).unwrap(), params);
    }

    #[test]
    fn test_empty_slot_differs_from_absent_slot() {
        let mut params = QueryParams::new();
        params.where_raw = Some(Vec::new());
        assert!(!params.is_empty());
        assert_eq!(params.to_structure(), json!({"whereRaw": []}));

        let decoded = deserialize(&serialize(&params)).unwrap();
        assert_eq!(decoded.where_raw, Some(Vec::new()));
        assert_ne!(decoded, QueryParams::new());
    }

    #[test]
    fn test_populated_slots() {
        let mut params = QueryParams::new();
        params.limit = Some(5);
        params.group_by = Some(vec!["status".to_string()]);
        assert_eq!(params.populated_slots(), vec!["groupBy", "limit"]);
    }

    #[test]
    fn test_effective_predicates() {
        let mut params = QueryParams::new();
        params.filter = Some([("status".to_string(), Value::from("active"))].into_iter().collect());
        params.where_raw = Some(vec![Predicate::new("age", Operator::GreaterThan, 18)]);

        let predicates = params.effective_predicates();
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0], Predicate::eq("status", "active"));
        assert_eq!(predicates[1].operator, Operator::GreaterThan);
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        assert!(QueryParams::from_structure(&json!([])).unwrap_err().is_format());
        assert!(QueryParams::from_structure(&json!({"limit": -1})).unwrap_err().is_format());
    }

    #[test]
    fn test_serde_integration() {
        let mut params = QueryParams::new();
        params.limit = Some(10);
        let text = serde_json::to_string(&params).unwrap();
        assert_eq!(text, r#"{"limit":10}"#);
        assert_eq!(serde_json::from_str::<QueryParams>(&text).unwrap(), params);
        assert!(serde_json::from_str::<QueryParams>(r#"{"whereRaw":[{"field":"a","operator":"??","value":1}]}"#).is_err());
    }
}
