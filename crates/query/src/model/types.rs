//! Clause enumerants and their fixed wire tokens

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::codec::Structural;
use crate::error::{QueryError, QueryResult};

/// Declares a closed enum whose variants map one-to-one onto wire tokens.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire token
            pub fn as_token(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// Strict token lookup used when decoding wire structures
            pub fn from_token(token: &str) -> QueryResult<Self> {
                match token {
                    $($token => Ok($name::$variant),)+
                    other => Err(QueryError::unknown_token($kind, other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_token())
            }
        }

        impl Structural for $name {
            fn to_structure(&self) -> JsonValue {
                JsonValue::String(self.as_token().to_string())
            }

            fn from_structure(value: &JsonValue) -> QueryResult<Self> {
                match value.as_str() {
                    Some(token) => Self::from_token(token),
                    None => Err(QueryError::unknown_token($kind, value.to_string())),
                }
            }
        }
    };
}

wire_enum! {
    /// Comparison operator shared by predicates and having clauses
    pub enum Operator as "operator" {
        Equal => "=",
        NotEqual => "!=",
        GreaterThan => ">",
        GreaterThanOrEqual => ">=",
        LessThan => "<",
        LessThanOrEqual => "<=",
        Like => "like",
        In => "in",
        NotIn => "not in",
        Between => "between",
        IsNull => "is null",
        IsNotNull => "is not null",
    }
}

impl Operator {
    /// Whether a predicate using this operator must carry a value
    pub fn requires_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    /// Lenient parse for caller input: `<>` is accepted for `!=` and word
    /// operators are case-insensitive. Wire decoding uses `from_token`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "<>" => Ok(Operator::NotEqual),
            "==" => Ok(Operator::Equal),
            other => Operator::from_token(other).map_err(|_| QueryError::unknown_token("operator", s)),
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = QueryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

wire_enum! {
    /// Boolean combinator for groups and chained predicates
    pub enum Combinator as "combinator" {
        And => "AND",
        Or => "OR",
    }
}

wire_enum! {
    /// Sort direction
    pub enum SortDirection as "sort direction" {
        Asc => "asc",
        Desc => "desc",
    }
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

wire_enum! {
    /// Placement of nulls within an ordering
    pub enum NullsPlacement as "null placement" {
        First => "first",
        Last => "last",
    }
}

wire_enum! {
    /// Aggregation function
    pub enum AggregateFunction as "aggregate function" {
        Count => "count",
        Sum => "sum",
        Avg => "avg",
        Min => "min",
        Max => "max",
    }
}

wire_enum! {
    /// Window function kind
    pub enum WindowFunction as "window function" {
        RowNumber => "row_number",
        Rank => "rank",
        DenseRank => "dense_rank",
        PercentRank => "percent_rank",
        CumeDist => "cume_dist",
        Ntile => "ntile",
        Lag => "lag",
        Lead => "lead",
        FirstValue => "first_value",
        LastValue => "last_value",
        NthValue => "nth_value",
        Sum => "sum",
        Avg => "avg",
        Count => "count",
    }
}

impl WindowFunction {
    /// Ranking functions operate on row position and take no source field
    pub fn is_ranking(&self) -> bool {
        matches!(
            self,
            WindowFunction::RowNumber
                | WindowFunction::Rank
                | WindowFunction::DenseRank
                | WindowFunction::PercentRank
                | WindowFunction::CumeDist
                | WindowFunction::Ntile
        )
    }
}

wire_enum! {
    /// Window frame unit
    pub enum FrameMode as "frame mode" {
        Rows => "ROWS",
        Range => "RANGE",
    }
}

wire_enum! {
    /// Output format requested for explain plans
    pub enum ExplainFormat as "explain format" {
        Text => "text",
        Json => "json",
        Yaml => "yaml",
        Xml => "xml",
    }
}
