//! # tabula-client: HTTP client for the Tabula query service
//!
//! Wires [`tabula_query`] builders to a remote service over HTTP, with
//! environment-driven configuration and structured logging setup.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;

pub use client::Client;
pub use config::{ClientConfig, ClientDefaults, ConfigError, ConfigSource};
pub use error::{ClientError, ClientResult};
pub use http::HttpTransport;
pub use logging::{init_logging, LoggingConfig};

pub use tabula_query;
