//! Explain-plan options

use serde_json::{Map, Value as JsonValue};

use super::types::ExplainFormat;
use crate::codec::{self, Structural};
use crate::error::QueryResult;

/// Options asking the remote executor for a query plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExplainOptions {
    pub analyze: Option<bool>,
    pub verbose: Option<bool>,
    pub costs: Option<bool>,
    pub buffers: Option<bool>,
    pub format: Option<ExplainFormat>,
}

impl ExplainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(mut self, analyze: bool) -> Self {
        self.analyze = Some(analyze);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn costs(mut self, costs: bool) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn buffers(mut self, buffers: bool) -> Self {
        self.buffers = Some(buffers);
        self
    }

    pub fn format(mut self, format: ExplainFormat) -> Self {
        self.format = Some(format);
        self
    }
}

impl Structural for ExplainOptions {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        for (key, flag) in [
            ("analyze", self.analyze),
            ("verbose", self.verbose),
            ("costs", self.costs),
            ("buffers", self.buffers),
        ] {
            if let Some(flag) = flag {
                obj.insert(key.into(), JsonValue::Bool(flag));
            }
        }
        if let Some(format) = &self.format {
            obj.insert("format".into(), format.to_structure());
        }
        JsonValue::Object(obj)
    }

    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        let obj = codec::as_object(value, "explain options")?;
        Ok(Self {
            analyze: codec::optional_bool(obj, "analyze", "explain options")?,
            verbose: codec::optional_bool(obj, "verbose", "explain options")?,
            costs: codec::optional_bool(obj, "costs", "explain options")?,
            buffers: codec::optional_bool(obj, "buffers", "explain options")?,
            format: codec::optional_of(obj, "format")?,
        })
    }
}
