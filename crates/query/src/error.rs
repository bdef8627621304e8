//! Error types for query building, wire decoding and transport delegation
//!
//! Format and validation errors are raised synchronously, before any
//! transport interaction. Transport errors are produced by the external
//! collaborator and surface through the same enum.

use thiserror::Error;

/// Result type alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Machine-readable code attached to responses that carry an `error` field
pub const REMOTE_ERROR: &str = "REMOTE_ERROR";

/// Machine-readable code for `execute()` on a builder with no transport bound
pub const NOT_CONNECTED: &str = "NOT_CONNECTED";

/// Error types for query operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A wire token or key did not match the expected shape during decoding
    #[error("Format error: {message}")]
    Format { value: String, message: String },

    /// Caller-supplied payload was rejected before any transport call
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The remote call failed or returned a non-success status
    #[error("Transport error [{code}]: {message}")]
    Transport {
        message: String,
        code: String,
        status: Option<u16>,
    },
}

impl QueryError {
    /// A token that is not one of the fixed enumerants of `kind`
    pub fn unknown_token(kind: &str, token: impl Into<String>) -> Self {
        let value = token.into();
        Self::Format {
            message: format!("unknown {} token '{}'", kind, value),
            value,
        }
    }

    /// A required key is absent from a structural mapping
    pub fn missing_key(context: &str, key: impl Into<String>) -> Self {
        let value = key.into();
        Self::Format {
            message: format!("missing required key '{}' in {}", value, context),
            value,
        }
    }

    /// A value is present but has the wrong structural type
    pub fn wrong_type(context: &str, expected: &str, found: &serde_json::Value) -> Self {
        let value = found.to_string();
        Self::Format {
            message: format!("expected {} in {}, found {}", expected, context, value),
            value,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>, code: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            code: code.into(),
            status,
        }
    }

    /// Raised by `execute()` when the builder was never bound to a transport
    pub fn not_connected() -> Self {
        Self::transport("no transport bound to this query builder", NOT_CONNECTED, None)
    }

    /// Offending value for format errors
    pub fn value(&self) -> Option<&str> {
        match self {
            QueryError::Format { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Machine-readable code for transport errors
    pub fn code(&self) -> Option<&str> {
        match self {
            QueryError::Transport { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Status code reported by the remote service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, QueryError::Format { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QueryError::Validation { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, QueryError::Transport { .. })
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format {
            value: String::new(),
            message: err.to_string(),
        }
    }
}
