//! Query Builder nested groups and EXISTS subqueries

use super::{push, QueryBuilder};
use crate::model::{BooleanGroup, Combinator, Condition, JoinCondition, Predicate, SubqueryCondition};

impl QueryBuilder {
    /// Open an OR group configured on a scoped builder
    pub fn or_where<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.push_group(Combinator::Or, f)
    }

    /// Open an AND group configured on a scoped builder
    pub fn and_where<F>(self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.push_group(Combinator::And, f)
    }

    fn push_group<F>(mut self, combinator: Combinator, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let group = f(self.scope()).into_group(combinator);
        if group.is_empty() {
            tracing::debug!("Skipping empty {} group on '{}'", combinator, self.table);
            return self;
        }
        push(&mut self.params.where_groups, group);
        self
    }

    /// Fold a scoped builder into one group: equality filters in insertion
    /// order, then explicit predicates, then the scope's own groups
    pub(crate) fn into_group(self, combinator: Combinator) -> BooleanGroup {
        let QueryBuilder {
            table,
            mut params,
            filter_order,
            ..
        } = self;

        let mut filter = params.filter.take().unwrap_or_default();
        let mut conditions: Vec<Condition> = Vec::new();
        for field in filter_order {
            if let Some(value) = filter.remove(&field) {
                conditions.push(Predicate::eq(field, value).into());
            }
        }
        conditions.extend(filter.into_iter().map(|(field, value)| Predicate::eq(field, value).into()));
        conditions.extend(params.where_raw.take().into_iter().flatten().map(Condition::from));
        conditions.extend(params.where_groups.take().into_iter().flatten().map(Condition::from));

        let ignored = params.populated_slots();
        if !ignored.is_empty() {
            tracing::warn!("Group scope on '{}' ignores clauses {:?}", table, ignored);
        }

        BooleanGroup { combinator, conditions }
    }

    /// Correlated EXISTS over `table`, configured on a fresh builder
    pub fn where_exists<F>(self, table: &str, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let query = f(QueryBuilder::new(table)).into_params();
        self.push_exists(SubqueryCondition::exists(table, query))
    }

    /// EXISTS joined to the outer row on `left_field = right_field`
    pub fn where_exists_join<F>(self, table: &str, left_field: &str, right_field: &str, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let query = f(QueryBuilder::new(table)).into_params();
        self.push_exists(
            SubqueryCondition::exists(table, query).joined_on(JoinCondition::equals(left_field, right_field)),
        )
    }

    pub fn where_not_exists<F>(self, table: &str, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let query = f(QueryBuilder::new(table)).into_params();
        self.push_exists(SubqueryCondition::not_exists(table, query))
    }

    pub fn where_not_exists_join<F>(self, table: &str, left_field: &str, right_field: &str, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let query = f(QueryBuilder::new(table)).into_params();
        self.push_exists(
            SubqueryCondition::not_exists(table, query).joined_on(JoinCondition::equals(left_field, right_field)),
        )
    }

    fn push_exists(mut self, condition: SubqueryCondition) -> Self {
        push(&mut self.params.where_exists, condition);
        self
    }
}
