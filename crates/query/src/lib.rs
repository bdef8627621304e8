//! # tabula-query: client-side query representation for Tabula
//!
//! Describe a relational query (filters, correlated subqueries, grouping,
//! aggregation, window functions, CTEs, ordering, pagination) through a
//! fluent [`QueryBuilder`], and serialize the resulting [`QueryParams`] into
//! a transport-neutral structure that a remote query service executes.
//!
//! ```
//! use tabula_query::{QueryBuilder, Operator, Structural};
//!
//! let params = QueryBuilder::new("users")
//!     .where_eq("status", "active")
//!     .where_op("age", Operator::GreaterThanOrEqual, 18)
//!     .limit(10)
//!     .to_params();
//!
//! assert_eq!(params.to_structure()["limit"], 10);
//! ```
//!
//! No SQL is generated here. The core only builds the request and hands it
//! to a [`Transport`].

pub mod builder;
pub mod codec;
pub mod error;
pub mod model;
pub mod params;
pub mod transport;
pub mod value;

pub use builder::execution::Payload;
pub use builder::QueryBuilder;
pub use codec::{decode_query_string, encode_query_pairs, to_query_string, Structural};
pub use error::*;
pub use model::*;
pub use params::*;
pub use transport::*;
pub use value::Value;
