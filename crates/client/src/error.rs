//! Error types for the client crate

use tabula_query::QueryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for client setup
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// The underlying HTTP client could not be constructed
    #[error("HTTP client error: {message}")]
    Http { message: String },
}

impl ClientError {
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }
}
