//! Query Builder grouping, ordering, pagination and window functions

use super::{push, QueryBuilder};
use crate::model::{
    AdvancedWindowSpec, AggregateFunction, AggregateSpec, HavingClause, NullsPlacement, Operator, OrderSpec,
    SortDirection, WindowFunction, WindowSpec,
};
use crate::value::Value;

impl QueryBuilder {
    /// Replace the GROUP BY field list
    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.params.group_by = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn having(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        push(&mut self.params.having, HavingClause::new(field, operator, value));
        self
    }

    pub fn aggregate(mut self, spec: AggregateSpec) -> Self {
        push(&mut self.params.aggregates, spec);
        self
    }

    fn aggregate_fn(self, function: AggregateFunction, field: &str, alias: Option<&str>) -> Self {
        let spec = AggregateSpec::new(function, field);
        let spec = match alias {
            Some(alias) => spec.alias(alias),
            None => spec,
        };
        self.aggregate(spec)
    }

    pub fn count(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate_fn(AggregateFunction::Count, field, alias)
    }

    pub fn sum(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate_fn(AggregateFunction::Sum, field, alias)
    }

    pub fn avg(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate_fn(AggregateFunction::Avg, field, alias)
    }

    pub fn min(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate_fn(AggregateFunction::Min, field, alias)
    }

    pub fn max(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate_fn(AggregateFunction::Max, field, alias)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        push(&mut self.params.order_by, OrderSpec::new(field, direction));
        self
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, SortDirection::Desc)
    }

    pub fn order_by_nulls(
        mut self,
        field: impl Into<String>,
        direction: SortDirection,
        nulls: NullsPlacement,
    ) -> Self {
        push(&mut self.params.order_by, OrderSpec::new(field, direction).nulls(nulls));
        self
    }

    /// Replace the projected field list
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.params.select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.params.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: u64) -> Self {
        self.params.offset = Some(count);
        self
    }

    /// Set limit and offset for a 1-based page number; page 0 is treated as 1
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(per_page).offset(offset)
    }

    pub fn window(mut self, spec: WindowSpec) -> Self {
        self.warn_duplicate_alias(&spec.alias);
        push(&mut self.params.windows, spec);
        self
    }

    pub fn window_advanced(mut self, spec: AdvancedWindowSpec) -> Self {
        self.warn_duplicate_alias(&spec.window.alias);
        push(&mut self.params.advanced_windows, spec);
        self
    }

    /// ROW_NUMBER() OVER (PARTITION BY .. ORDER BY ..)
    pub fn row_number(self, alias: &str, partition_by: &[&str], order: OrderSpec) -> Self {
        self.window(
            WindowSpec::new(WindowFunction::RowNumber, alias)
                .partition_by(partition_by)
                .order_by(order),
        )
    }

    pub fn rank(self, alias: &str, partition_by: &[&str], order: OrderSpec) -> Self {
        self.window(
            WindowSpec::new(WindowFunction::Rank, alias)
                .partition_by(partition_by)
                .order_by(order),
        )
    }

    /// LAG(field, offset) OVER (ORDER BY ..)
    pub fn lag(self, field: &str, alias: &str, offset: u64, order: OrderSpec) -> Self {
        self.window(
            WindowSpec::new(WindowFunction::Lag, alias)
                .field(field)
                .order_by(order)
                .arg(offset),
        )
    }

    /// LEAD(field, offset) OVER (ORDER BY ..)
    pub fn lead(self, field: &str, alias: &str, offset: u64, order: OrderSpec) -> Self {
        self.window(
            WindowSpec::new(WindowFunction::Lead, alias)
                .field(field)
                .order_by(order)
                .arg(offset),
        )
    }

    fn warn_duplicate_alias(&self, alias: &str) {
        let taken = self.params.windows.iter().flatten().any(|w| w.alias == alias)
            || self
                .params
                .advanced_windows
                .iter()
                .flatten()
                .any(|w| w.window.alias == alias);
        if taken {
            tracing::warn!("Window alias '{}' is already used on '{}'", alias, self.table);
        }
    }
}
