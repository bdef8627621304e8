//! Ordering clauses

use serde_json::{Map, Value as JsonValue};

use super::types::{NullsPlacement, SortDirection};
use crate::codec::{self, Structural};
use crate::error::QueryResult;

/// Sort instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub direction: SortDirection,
    pub nulls: Option<NullsPlacement>,
}

impl OrderSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            nulls: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    pub fn nulls(mut self, placement: NullsPlacement) -> Self {
        self.nulls = Some(placement);
        self
    }

    pub fn nulls_first(self) -> Self {
        self.nulls(NullsPlacement::First)
    }

    pub fn nulls_last(self) -> Self {
        self.nulls(NullsPlacement::Last)
    }
}

impl Structural for OrderSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("field".into(), JsonValue::String(self.field.clone()));
        obj.insert("direction".into(), self.direction.to_structure());
        if let Some(nulls) = &self.nulls {
            obj.insert("nulls".into(), nulls.to_structure());
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "order spec")?;
        Ok(Self {
            field: codec::required_str(obj, "field", "order spec")?,
            // direction defaults to ascending when omitted
            direction: codec::optional_of(obj, "direction")?.unwrap_or_default(),
            nulls: codec::optional_of(obj, "nulls")?,
        })
    }
}
