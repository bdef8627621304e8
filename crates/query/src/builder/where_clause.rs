//! Query Builder WHERE clause operations

use std::collections::BTreeMap;

use super::{push, QueryBuilder};
use crate::model::{Combinator, NullnessClause, Operator, Predicate, RangeClause, SetClause};
use crate::value::Value;

impl QueryBuilder {
    /// Equality filter; a later call for the same field overwrites the value
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if !self.filter_order.contains(&field) {
            self.filter_order.push(field.clone());
        }
        self.params
            .filter
            .get_or_insert_with(BTreeMap::new)
            .insert(field, value.into());
        self
    }

    /// Merge several equality filters, last write per field wins
    pub fn where_map<I, K, V>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        filters
            .into_iter()
            .fold(self, |query, (field, value)| query.where_eq(field, value))
    }

    /// Explicit operator predicate. Appends; never merges with an earlier
    /// predicate on the same field, and is kept apart from `where_eq` filters
    /// on the wire even when the operator is `=`.
    pub fn where_op(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        push(&mut self.params.where_raw, Predicate::new(field, operator, value));
        self
    }

    /// Explicit predicate joined to the previous one with OR
    pub fn or_where_op(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        push(
            &mut self.params.where_raw,
            Predicate::new(field, operator, value).with_combinator(Combinator::Or),
        );
        self
    }

    /// Append an already-constructed predicate
    pub fn where_predicate(mut self, predicate: Predicate) -> Self {
        push(&mut self.params.where_raw, predicate);
        self
    }

    /// Inclusive range
    pub fn where_between(mut self, field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        push(&mut self.params.where_between, RangeClause::new(field, low, high));
        self
    }

    pub fn where_in<T: Into<Value>>(mut self, field: impl Into<String>, values: Vec<T>) -> Self {
        let clause = SetClause::new(field, values);
        if clause.values.is_empty() {
            tracing::warn!("where_in on '{}' with an empty value set", clause.field);
        }
        push(&mut self.params.where_in, clause);
        self
    }

    pub fn where_not_in<T: Into<Value>>(mut self, field: impl Into<String>, values: Vec<T>) -> Self {
        let clause = SetClause::new(field, values);
        if clause.values.is_empty() {
            tracing::warn!("where_not_in on '{}' with an empty value set", clause.field);
        }
        push(&mut self.params.where_not_in, clause);
        self
    }

    pub fn where_null(mut self, field: impl Into<String>) -> Self {
        push(&mut self.params.where_null, NullnessClause::null(field));
        self
    }

    pub fn where_not_null(mut self, field: impl Into<String>) -> Self {
        push(&mut self.params.where_null, NullnessClause::not_null(field));
        self
    }
}
