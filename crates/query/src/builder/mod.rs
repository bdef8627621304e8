//! Query Builder - fluent accumulator that assembles [`QueryParams`]
//!
//! Every operation consumes and returns the builder so calls chain. Nested
//! groups, EXISTS subqueries and CTEs are configured on fresh scoped builders
//! whose finalized params are embedded by value.

pub mod aggregation;
pub mod execution;
pub mod groups;
pub mod transform;
pub mod where_clause;
pub mod with;

use std::fmt;
use std::sync::Arc;

use crate::params::QueryParams;
use crate::transport::Transport;

/// Query builder for one table
#[derive(Clone)]
pub struct QueryBuilder {
    pub(crate) table: String,
    pub(crate) params: QueryParams,
    /// Insertion order of equality-filter keys, used when a scoped builder's
    /// filters are folded into a group
    pub(crate) filter_order: Vec<String>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
}

impl QueryBuilder {
    /// Create a new query builder for the given table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            params: QueryParams::default(),
            filter_order: Vec::new(),
            transport: None,
        }
    }

    /// Fresh, independent builder for the same table, used for nested groups
    /// and CTE bodies. It carries no clauses and no transport.
    pub fn scope(&self) -> Self {
        Self::new(self.table.clone())
    }

    /// Bind the transport that `execute()` and the record calls delegate to
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Snapshot of the accumulated clauses. Repeated calls with no
    /// intervening mutation yield equal params, and the builder remains
    /// usable afterwards.
    pub fn to_params(&self) -> QueryParams {
        tracing::debug!(
            "Finalized query params for '{}': {:?}",
            self.table,
            self.params.populated_slots()
        );
        self.params.clone()
    }

    /// Consume the builder, returning its params without cloning
    pub fn into_params(self) -> QueryParams {
        self.params
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("params", &self.params)
            .field("transport", &self.transport.as_ref().map(|t| t.name()))
            .finish()
    }
}

pub(crate) fn push<T>(slot: &mut Option<Vec<T>>, item: T) {
    slot.get_or_insert_with(Vec::new).push(item);
}
