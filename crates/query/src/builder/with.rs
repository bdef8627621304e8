//! Query Builder common table expressions

use super::{push, QueryBuilder};
use crate::model::{Cte, RecursiveCte};

impl QueryBuilder {
    /// Wrap an already-built query as a named CTE. Its table becomes the CTE
    /// source table.
    pub fn with_query(self, name: &str, query: &QueryBuilder, columns: Option<&[&str]>) -> Self {
        let cte = Cte::new(name, query.to_params()).from_table(query.table());
        self.push_cte(cte, columns)
    }

    /// Build a named CTE on a fresh scoped builder for this table
    pub fn with_cte<F>(self, name: &str, f: F, columns: Option<&[&str]>) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let scoped = f(self.scope());
        let cte = Cte::new(name, scoped.to_params()).from_table(scoped.table());
        self.push_cte(cte, columns)
    }

    fn push_cte(mut self, cte: Cte, columns: Option<&[&str]>) -> Self {
        let cte = match columns {
            Some(columns) => cte.columns(columns),
            None => cte,
        };
        if self.cte_name_taken(&cte.name) {
            tracing::warn!("CTE '{}' is declared more than once on '{}'", cte.name, self.table);
        }
        push(&mut self.params.with, cte);
        self
    }

    /// Recursive CTE from an initial and a recursive term. The recursive term
    /// is not required to mention `name`; a warning is logged when it does not.
    pub fn with_recursive(
        mut self,
        name: &str,
        initial: &QueryBuilder,
        recursive: &QueryBuilder,
        union_all: bool,
        columns: Option<&[&str]>,
    ) -> Self {
        let mut cte = RecursiveCte::new(name, initial.to_params(), recursive.to_params());
        cte.initial_table = Some(initial.table().to_string());
        cte.recursive_table = Some(recursive.table().to_string());
        cte.union_all = union_all;
        cte.columns = columns.map(|c| c.iter().map(|s| s.to_string()).collect());

        if !cte.references_self() {
            tracing::warn!("Recursive CTE '{}' never references itself", name);
        }
        if self.cte_name_taken(name) {
            tracing::warn!("CTE '{}' is declared more than once on '{}'", name, self.table);
        }
        push(&mut self.params.with_recursive, cte);
        self
    }

    fn cte_name_taken(&self, name: &str) -> bool {
        self.params.with.iter().flatten().any(|c| c.name == name)
            || self.params.with_recursive.iter().flatten().any(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Structural;
    use crate::model::Operator;
    use serde_json::json;

    #[test]
    fn test_with_query_wraps_builder() {
        let recent = QueryBuilder::new("orders").where_op("created_at", Operator::GreaterThan, "2024-01-01");
        let params = QueryBuilder::new("recent")
            .with_query("recent", &recent, Some(&["id", "total"]))
            .to_params();

        assert_eq!(
            params.to_structure()["with"],
            json!([{
                "name": "recent",
                "table": "orders",
                "query": {"whereRaw": [{"field": "created_at", "operator": ">", "value": "2024-01-01"}]},
                "columns": ["id", "total"],
            }])
        );
    }

    #[test]
    fn test_with_cte_uses_scoped_builder() {
        let params = QueryBuilder::new("users")
            .with_cte("active", |q| q.where_eq("status", "active"), None)
            .limit(5)
            .to_params();

        let cte = &params.with.unwrap()[0];
        assert_eq!(cte.name, "active");
        assert_eq!(cte.table.as_deref(), Some("users"));
        assert_eq!(cte.query.to_structure(), json!({"filter": {"status": "active"}}));
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn test_duplicate_cte_names_pass_through() {
        let base = QueryBuilder::new("t");
        let params = QueryBuilder::new("t")
            .with_query("x", &base, None)
            .with_query("x", &base, None)
            .to_params();
        assert_eq!(params.with.map(|w| w.len()), Some(2));
    }

    #[test]
    fn test_recursive_cte_shape() {
        let init = QueryBuilder::new("categories").where_null("parent_id");
        let rec = QueryBuilder::new("categories").where_exists_join("h", "categories.parent_id", "h.id", |q| q);

        let params = QueryBuilder::new("h")
            .with_recursive("h", &init, &rec, true, Some(&["id", "parent_id"]))
            .to_params();

        let cte = &params.with_recursive.as_ref().unwrap()[0];
        assert_eq!(cte.name, "h");
        assert!(cte.union_all);
        assert_eq!(cte.columns, Some(vec!["id".to_string(), "parent_id".to_string()]));
        assert_eq!(cte.initial, init.to_params());
        assert_eq!(cte.recursive, rec.to_params());
        assert!(cte.references_self());

        let structure = params.to_structure();
        assert_eq!(structure["withRecursive"][0]["unionAll"], json!(true));
        assert_eq!(structure["withRecursive"][0]["initialTable"], json!("categories"));
    }

    #[test]
    fn test_recursive_cte_without_self_reference_is_kept() {
        let init = QueryBuilder::new("a");
        let rec = QueryBuilder::new("b");
        let params = QueryBuilder::new("a")
            .with_recursive("tree", &init, &rec, false, None)
            .to_params();

        let cte = &params.with_recursive.unwrap()[0];
        assert!(!cte.references_self());
        assert!(!cte.union_all);
        assert_eq!(cte.columns, None);
    }
}
