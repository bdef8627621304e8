//! Clause Model - immutable value types for every clause kind

pub mod aggregates;
pub mod conditions;
pub mod cte;
pub mod explain;
pub mod groups;
pub mod ordering;
pub mod raw;
pub mod subquery;
pub mod transform;
pub mod types;
pub mod window;

pub use aggregates::AggregateSpec;
pub use conditions::{HavingClause, NullnessClause, Predicate, RangeClause, SetClause};
pub use cte::{Cte, RecursiveCte};
pub use explain::ExplainOptions;
pub use groups::{BooleanGroup, Condition};
pub use ordering::OrderSpec;
pub use raw::RawExpression;
pub use subquery::{JoinCondition, SubqueryCondition};
pub use transform::{PivotSpec, TransformSpec};
pub use types::{
    AggregateFunction, Combinator, ExplainFormat, FrameMode, NullsPlacement, Operator, SortDirection,
    WindowFunction,
};
pub use window::{AdvancedWindowSpec, FrameBound, FrameSpec, OverClause, WindowSpec};
