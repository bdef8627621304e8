//! Entry point that hands out transport-bound query builders

use std::fmt;
use std::sync::Arc;

use tabula_query::{QueryBuilder, Transport};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::HttpTransport;

/// Query service client
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client over any transport, e.g. a test double
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        tracing::debug!("Creating query client for {}", config.base_url);
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Builder for `table`, bound to this client's transport
    pub fn table(&self, name: &str) -> QueryBuilder {
        QueryBuilder::new(name).with_transport(Arc::clone(&self.transport))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::ClientError;

    #[test]
    fn test_table_is_bound() {
        let client = Client::from_config(ClientConfig::new("https://example.com")).unwrap();
        let query = client.table("users");
        assert_eq!(query.table(), "users");
        assert!(query.is_connected());
        assert_eq!(format!("{:?}", client), "Client { transport: \"http\" }");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Client::from_config(ClientConfig::new("localhost")).unwrap_err();
        assert!(matches!(err, ClientError::Config(ConfigError::InvalidValue { .. })));
    }
}
