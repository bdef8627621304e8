//! Window functions, OVER clauses and frames

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};

use super::conditions::Predicate;
use super::ordering::OrderSpec;
use super::types::{FrameMode, WindowFunction};
use crate::codec::{self, Structural};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// One end of a window frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => write!(f, "UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{} PRECEDING", n),
            FrameBound::CurrentRow => write!(f, "CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{} FOLLOWING", n),
            FrameBound::UnboundedFollowing => write!(f, "UNBOUNDED FOLLOWING"),
        }
    }
}

impl FromStr for FrameBound {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNBOUNDED PRECEDING" => return Ok(FrameBound::UnboundedPreceding),
            "CURRENT ROW" => return Ok(FrameBound::CurrentRow),
            "UNBOUNDED FOLLOWING" => return Ok(FrameBound::UnboundedFollowing),
            _ => {}
        }
        // only the canonical decimal form is accepted, so "+3" and "03" are rejected
        let offset = |rest: &str| match rest.parse::<u64>() {
            Ok(n) if n.to_string() == rest => Ok(n),
            _ => Err(QueryError::unknown_token("frame bound", s)),
        };
        if let Some(rest) = s.strip_suffix(" PRECEDING") {
            Ok(FrameBound::Preceding(offset(rest)?))
        } else if let Some(rest) = s.strip_suffix(" FOLLOWING") {
            Ok(FrameBound::Following(offset(rest)?))
        } else {
            Err(QueryError::unknown_token("frame bound", s))
        }
    }
}

impl Structural for FrameBound {
    fn to_structure(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        match value.as_str() {
            Some(text) => text.parse(),
            None => Err(QueryError::unknown_token("frame bound", value.to_string())),
        }
    }
}

/// Window frame descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub mode: FrameMode,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl FrameSpec {
    pub fn rows(start: FrameBound) -> Self {
        Self {
            mode: FrameMode::Rows,
            start,
            end: None,
        }
    }

    pub fn range(start: FrameBound) -> Self {
        Self {
            mode: FrameMode::Range,
            start,
            end: None,
        }
    }

    pub fn between(mut self, end: FrameBound) -> Self {
        self.end = Some(end);
        self
    }

    /// ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
    pub fn running() -> Self {
        Self::rows(FrameBound::UnboundedPreceding).between(FrameBound::CurrentRow)
    }
}

impl Structural for FrameSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("mode".into(), self.mode.to_structure());
        obj.insert("start".into(), self.start.to_structure());
        if let Some(end) = &self.end {
            obj.insert("end".into(), end.to_structure());
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "frame spec")?;
        Ok(Self {
            mode: FrameMode::from_structure(codec::required(obj, "mode", "frame spec")?)?,
            start: FrameBound::from_structure(codec::required(obj, "start", "frame spec")?)?,
            end: codec::optional_of(obj, "end")?,
        })
    }
}

/// Partitioning, ordering and frame of a window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverClause {
    pub partition_by: Vec<String>,
    pub order_by: Vec<OrderSpec>,
    pub frame: Option<FrameSpec>,
}

impl OverClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by(mut self, fields: &[&str]) -> Self {
        self.partition_by = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn frame(mut self, frame: FrameSpec) -> Self {
        self.frame = Some(frame);
        self
    }

    fn write_into(&self, obj: &mut Map<String, JsonValue>) {
        if !self.partition_by.is_empty() {
            obj.insert("partitionBy".into(), codec::strings_to_structure(&self.partition_by));
        }
        if !self.order_by.is_empty() {
            obj.insert("orderBy".into(), codec::list_to_structure(&self.order_by));
        }
        if let Some(frame) = &self.frame {
            obj.insert("frame".into(), frame.to_structure());
        }
    }

    fn read_from(obj: &Map<String, JsonValue>, context: &str) -> QueryResult<Self> {
        Ok(Self {
            partition_by: codec::optional_string_list(obj, "partitionBy", context)?.unwrap_or_default(),
            order_by: codec::optional_list_of(obj, "orderBy", context)?.unwrap_or_default(),
            frame: codec::optional_of(obj, "frame")?,
        })
    }
}

impl Structural for OverClause {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        self.write_into(&mut obj);
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        Self::read_from(codec::as_object(value, "over clause")?, "over clause")
    }
}

/// Window function with inline partition/order/frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub function: WindowFunction,
    pub field: Option<String>,
    pub alias: String,
    pub over: OverClause,
    /// Extra function arguments: lag/lead offset and default, ntile buckets,
    /// nth_value position
    pub args: Vec<Value>,
}

impl WindowSpec {
    pub fn new(function: WindowFunction, alias: impl Into<String>) -> Self {
        Self {
            function,
            field: None,
            alias: alias.into(),
            over: OverClause::default(),
            args: Vec::new(),
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn partition_by(mut self, fields: &[&str]) -> Self {
        self.over = self.over.partition_by(fields);
        self
    }

    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.over = self.over.order_by(order);
        self
    }

    pub fn frame(mut self, frame: FrameSpec) -> Self {
        self.over = self.over.frame(frame);
        self
    }

    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Structural for WindowSpec {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("type".into(), self.function.to_structure());
        if let Some(field) = &self.field {
            obj.insert("field".into(), JsonValue::String(field.clone()));
        }
        obj.insert("alias".into(), JsonValue::String(self.alias.clone()));
        self.over.write_into(&mut obj);
        if !self.args.is_empty() {
            obj.insert("args".into(), codec::values_to_structure(&self.args));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "window spec")?;
        Ok(Self {
            function: WindowFunction::from_structure(codec::required(obj, "type", "window spec")?)?,
            field: codec::optional_str(obj, "field", "window spec")?,
            alias: codec::required_str(obj, "alias", "window spec")?,
            over: OverClause::read_from(obj, "window spec")?,
            args: match obj.get("args") {
                Some(args) => codec::value_list(args, "window spec")?,
                None => Vec::new(),
            },
        })
    }
}

/// Window function with an explicit OVER clause and post-window filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedWindowSpec {
    pub window: WindowSpec,
    /// Predicates applied to the windowed result, typically against the alias
    pub filters: Vec<Predicate>,
}

impl AdvancedWindowSpec {
    pub fn new(window: WindowSpec) -> Self {
        Self {
            window,
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }
}

impl Structural for AdvancedWindowSpec {
    fn to_structure(&self) -> JsonValue {
        let window = &self.window;
        let mut obj = Map::new();
        obj.insert("type".into(), window.function.to_structure());
        if let Some(field) = &window.field {
            obj.insert("field".into(), JsonValue::String(field.clone()));
        }
        obj.insert("alias".into(), JsonValue::String(window.alias.clone()));
        obj.insert("over".into(), window.over.to_structure());
        if !window.args.is_empty() {
            obj.insert("args".into(), codec::values_to_structure(&window.args));
        }
        if !self.filters.is_empty() {
            obj.insert("filter".into(), codec::list_to_structure(&self.filters));
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let context = "advanced window spec";
        let obj = codec::as_object(value, context)?;
        let over = match obj.get("over") {
            Some(over) => OverClause::from_structure(over)?,
            None => OverClause::default(),
        };
        Ok(Self {
            window: WindowSpec {
                function: WindowFunction::from_structure(codec::required(obj, "type", context)?)?,
                field: codec::optional_str(obj, "field", context)?,
                alias: codec::required_str(obj, "alias", context)?,
                over,
                args: match obj.get("args") {
                    Some(args) => codec::value_list(args, context)?,
                    None => Vec::new(),
                },
            },
            filters: codec::optional_list_of(obj, "filter", context)?.unwrap_or_default(),
        })
    }
}
