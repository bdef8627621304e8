//! Transport collaborator interface
//!
//! The core never performs I/O itself. It builds a [`TransportRequest`] and
//! hands it to a [`Transport`] implementation, which owns HTTP, retries and
//! interceptors.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::codec::{self, Structural};
use crate::error::{QueryError, QueryResult, REMOTE_ERROR};
use crate::params::QueryParams;
use crate::value::Value;

/// One result row: field name to value
pub type Row = BTreeMap<String, Value>;

/// Query-string flag asking the service to echo params instead of rows
pub const PARAMS_ONLY_FLAG: &str = "paramsOnly";

/// HTTP-style verb of a transport request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully encoded request for the remote query service
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// `/<table>` or `/<table>/<id>`
    pub path: String,
    /// URL-safe query pairs, already component-encoded
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl TransportRequest {
    /// Read request: params travel as query-string pairs
    pub fn read(table: &str, params: &QueryParams) -> Self {
        Self {
            method: Method::Get,
            path: resource_path(table, None),
            query: codec::encode_query_pairs(&params.to_structure()),
            body: None,
        }
    }

    pub fn create(table: &str, body: JsonValue) -> Self {
        Self {
            method: Method::Post,
            path: resource_path(table, None),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn update(table: &str, id: &str, body: JsonValue) -> Self {
        Self {
            method: Method::Put,
            path: resource_path(table, Some(id)),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(table: &str, id: &str, body: Option<JsonValue>) -> Self {
        Self {
            method: Method::Delete,
            path: resource_path(table, Some(id)),
            query: Vec::new(),
            body,
        }
    }

    pub fn with_query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Joined query string without the leading `?`
    pub fn query_string(&self) -> String {
        codec::join_query_pairs(&self.query)
    }

    /// Path plus query string
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}

fn resource_path(table: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("/{}/{}", urlencoding::encode(table), urlencoding::encode(id)),
        None => format!("/{}", urlencoding::encode(table)),
    }
}

/// Decoded service response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub data: Vec<Row>,
    /// Echoed params, when parameter-only introspection was requested
    pub params: Option<QueryParams>,
    pub message: Option<String>,
    pub error: Option<String>,
    /// Identifier of a newly created row
    pub id: Option<i64>,
}

impl QueryResponse {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            data: rows,
            ..Self::default()
        }
    }

    /// Surface an `error` field carried by an otherwise successful response
    pub fn into_result(self) -> QueryResult<Self> {
        match &self.error {
            Some(error) => Err(QueryError::transport(error.clone(), REMOTE_ERROR, None)),
            None => Ok(self),
        }
    }
}

impl Structural for QueryResponse {
    fn to_structure(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(
            "data".into(),
            JsonValue::Array(self.data.iter().map(codec::value_map_to_structure).collect()),
        );
        if let Some(params) = &self.params {
            obj.insert("params".into(), params.to_structure());
        }
        if let Some(message) = &self.message {
            obj.insert("message".into(), JsonValue::String(message.clone()));
        }
        if let Some(error) = &self.error {
            obj.insert("error".into(), JsonValue::String(error.clone()));
        }
        if let Some(id) = self.id {
            obj.insert("id".into(), JsonValue::from(id));
        }
        JsonValue::Object(obj)
    }

    /// An empty body (`null`) decodes as an empty response
    fn from_structure(value: &JsonValue) -> QueryResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let context = "query response";
        let obj = codec::as_object(value, context)?;
        let data = match obj.get("data") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(rows) => codec::as_array(rows, context)?
                .iter()
                .map(|row| codec::value_map(row, "result row"))
                .collect::<QueryResult<Vec<_>>>()?,
        };
        Ok(Self {
            data,
            params: codec::optional_of(obj, "params")?,
            message: codec::optional_str(obj, "message", context)?,
            error: codec::optional_str(obj, "error", context)?,
            id: codec::optional_i64(obj, "id", context)?,
        })
    }
}

/// External collaborator that performs the request/response exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request; a single outstanding call per invocation
    async fn send(&self, request: TransportRequest) -> QueryResult<QueryResponse>;

    /// Transport name for logging
    fn name(&self) -> &'static str {
        "transport"
    }
}
