//! Common table expressions

use serde_json::{Map, Value as JsonValue};

use crate::codec::{self, Structural};
use crate::error::QueryResult;
use crate::params::QueryParams;

/// Named reusable subquery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cte {
    pub name: String,
    /// Source table of the embedded query
    pub table: Option<String>,
    pub query: QueryParams,
    pub columns: Option<Vec<String>>,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: QueryParams) -> Self {
        Self {
            name: name.into(),
            table: None,
            query,
            columns: None,
        }
    }

    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }
}

impl Structural for Cte {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("name".into(), JsonValue::String(self.name.clone()));
        if let Some(table) = &self.table {
            obj.insert("table".into(), JsonValue::String(table.clone()));
        }
        obj.insert("query".into(), self.query.to_structure());
        if let Some(columns) = &self.columns {
            obj.insert("columns".into(), codec::strings_to_structure(columns));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "cte")?;
        Ok(Self {
            name: codec::required_str(obj, "name", "cte")?,
            table: codec::optional_str(obj, "table", "cte")?,
            query: QueryParams::from_structure(codec::required(obj, "query", "cte")?)?,
            columns: codec::optional_string_list(obj, "columns", "cte")?,
        })
    }
}

/// Self-referential CTE built from an initial and a recursive term.
///
/// The recursive term is expected to reference `name`, but nothing enforces
/// it; see [`RecursiveCte::references_self`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveCte {
    pub name: String,
    pub initial: QueryParams,
    pub initial_table: Option<String>,
    pub recursive: QueryParams,
    pub recursive_table: Option<String>,
    /// UNION ALL when true, UNION otherwise
    pub union_all: bool,
    pub columns: Option<Vec<String>>,
}

impl RecursiveCte {
    pub fn new(name: impl Into<String>, initial: QueryParams, recursive: QueryParams) -> Self {
        Self {
            name: name.into(),
            initial,
            initial_table: None,
            recursive,
            recursive_table: None,
            union_all: false,
            columns: None,
        }
    }

    /// Whether the recursive term mentions the CTE name anywhere: as its
    /// source table, or inside any string of its structure (subquery tables,
    /// qualified fields, raw expressions)
    pub fn references_self(&self) -> bool {
        if self.recursive_table.as_deref() == Some(self.name.as_str()) {
            return true;
        }
        mentions(&self.recursive.to_structure(), &self.name)
    }
}

fn mentions(value: &JsonValue, name: &str) -> bool {
    match value {
        JsonValue::String(s) => names_word(s, name),
        JsonValue::Array(items) => items.iter().any(|item| mentions(item, name)),
        JsonValue::Object(map) => map.iter().any(|(key, item)| names_word(key, name) || mentions(item, name)),
        _ => false,
    }
}

fn names_word(text: &str, name: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word == name)
}

impl Structural for RecursiveCte {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("name".into(), JsonValue::String(self.name.clone()));
        obj.insert("initial".into(), self.initial.to_structure());
        if let Some(table) = &self.initial_table {
            obj.insert("initialTable".into(), JsonValue::String(table.clone()));
        }
        obj.insert("recursive".into(), self.recursive.to_structure());
        if let Some(table) = &self.recursive_table {
            obj.insert("recursiveTable".into(), JsonValue::String(table.clone()));
        }
        obj.insert("unionAll".into(), JsonValue::Bool(self.union_all));
        if let Some(columns) = &self.columns {
            obj.insert("columns".into(), codec::strings_to_structure(columns));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let context = "recursive cte";
        let obj = codec::as_object(value, context)?;
        Ok(Self {
            name: codec::required_str(obj, "name", context)?,
            initial: QueryParams::from_structure(codec::required(obj, "initial", context)?)?,
            initial_table: codec::optional_str(obj, "initialTable", context)?,
            recursive: QueryParams::from_structure(codec::required(obj, "recursive", context)?)?,
            recursive_table: codec::optional_str(obj, "recursiveTable", context)?,
            union_all: codec::optional_bool(obj, "unionAll", context)?.unwrap_or(false),
            columns: codec::optional_string_list(obj, "columns", context)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_cte_structure() {
        let cte = Cte::new("recent", QueryParams::default())
            .from_table("orders")
            .columns(&["id", "total"]);
        assert_eq!(
            cte.to_structure(),
            json!({"name": "recent", "table": "orders", "query": {}, "columns": ["id", "total"]})
        );
        assert_eq!(Cte::from_structure(&cte.to_structure()).unwrap(), cte);
    }

    #[test]
    fn test_recursive_cte_defaults_to_union() {
        let cte = RecursiveCte::from_structure(&json!({
            "name": "tree",
            "initial": {},
            "recursive": {},
        }))
        .unwrap();
        assert!(!cte.union_all);
        assert_eq!(cte.columns, None);
    }

    #[test]
    fn test_references_self() {
        let mut cte = RecursiveCte::new("tree", QueryParams::default(), QueryParams::default());
        assert!(!cte.references_self());

        cte.recursive_table = Some("tree".to_string());
        assert!(cte.references_self());

        let mut recursive = QueryParams::default();
        let mut filter = BTreeMap::new();
        filter.insert("parent_id".to_string(), Value::from("tree.id"));
        recursive.filter = Some(filter);
        let cte = RecursiveCte::new("tree", QueryParams::default(), recursive);
        assert!(cte.references_self());
    }

    #[test]
    fn test_similar_names_do_not_count() {
        let mut recursive = QueryParams::default();
        recursive.select = Some(vec!["trees_id".to_string()]);
        let cte = RecursiveCte::new("tree", QueryParams::default(), recursive);
        assert!(!cte.references_self());
    }
}
