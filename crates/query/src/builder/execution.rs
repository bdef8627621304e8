//! Query Builder execution and record calls
//!
//! All of these finalize the accumulated params and hand a single request to
//! the bound [`Transport`](crate::transport::Transport). Payload validation
//! happens before the transport is touched.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde_json::Value as JsonValue;

use super::QueryBuilder;
use crate::codec::Structural;
use crate::error::{QueryError, QueryResult};
use crate::params::QueryParams;
use crate::transport::{QueryResponse, TransportRequest, PARAMS_ONLY_FLAG};
use crate::value::Value;

/// Record payload for create and update calls
pub type Payload = BTreeMap<String, Value>;

impl QueryBuilder {
    /// Finalize and run the read through the bound transport
    pub async fn execute(&self) -> QueryResult<QueryResponse> {
        let params = self.to_params();
        self.send(TransportRequest::read(&self.table, &params)).await
    }

    /// Ask the service to echo the params it would execute, without rows
    pub async fn fetch_params(&self) -> QueryResult<QueryParams> {
        let params = self.to_params();
        let request = TransportRequest::read(&self.table, &params).with_query_pair(PARAMS_ONLY_FLAG, "true");
        let response = self.send(request).await?;
        response
            .params
            .ok_or_else(|| QueryError::transport("response carried no params", "MISSING_PARAMS", None))
    }

    /// Create a row. The accumulated params travel alongside the payload.
    pub async fn create(&self, payload: Payload) -> QueryResult<QueryResponse> {
        Self::validate_payload("create", &payload)?;
        let body = self.write_body(payload);
        self.send(TransportRequest::create(&self.table, body)).await
    }

    pub async fn update(&self, id: impl Display, payload: Payload) -> QueryResult<QueryResponse> {
        Self::validate_payload("update", &payload)?;
        let body = self.write_body(payload);
        self.send(TransportRequest::update(&self.table, &id.to_string(), body)).await
    }

    /// Delete a row; accumulated filters are sent as the body when present
    pub async fn delete(&self, id: impl Display) -> QueryResult<QueryResponse> {
        let params = self.to_params();
        let body = (!params.is_empty()).then(|| params.to_structure());
        self.send(TransportRequest::delete(&self.table, &id.to_string(), body)).await
    }

    fn validate_payload(operation: &str, payload: &Payload) -> QueryResult<()> {
        if payload.is_empty() {
            tracing::warn!("Rejected {} with an empty payload", operation);
            return Err(QueryError::validation(format!("{} requires a non-empty payload", operation)));
        }
        Ok(())
    }

    fn write_body(&self, payload: Payload) -> JsonValue {
        let mut body = match self.to_params().to_structure() {
            JsonValue::Object(obj) => obj,
            _ => serde_json::Map::new(),
        };
        body.insert("data".into(), crate::codec::value_map_to_structure(&payload));
        JsonValue::Object(body)
    }

    async fn send(&self, request: TransportRequest) -> QueryResult<QueryResponse> {
        let transport = self.transport.as_ref().ok_or_else(QueryError::not_connected)?;
        tracing::debug!("Sending {} {} via {}", request.method, request.target(), transport.name());

        match transport.send(request).await {
            Ok(response) => response.into_result(),
            Err(err) => {
                tracing::error!("Query on '{}' failed: {}", self.table, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NOT_CONNECTED, REMOTE_ERROR};
    use crate::transport::{Method, Transport};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Records every request and replies with a canned response
    struct RecordingTransport {
        requests: Mutex<Vec<TransportRequest>>,
        response: QueryResponse,
    }

    impl RecordingTransport {
        fn new(response: QueryResponse) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                response,
            })
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: TransportRequest) -> QueryResult<QueryResponse> {
            self.requests.lock().await.push(request);
            Ok(self.response.clone())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect()
    }

    #[tokio::test]
    async fn test_execute_without_transport() {
        let err = QueryBuilder::new("users").execute().await.unwrap_err();
        assert_eq!(err.code(), Some(NOT_CONNECTED));
    }

    #[tokio::test]
    async fn test_execute_sends_read_request() {
        let row: crate::transport::Row = [("id".to_string(), Value::from(1))].into_iter().collect();
        let transport = RecordingTransport::new(QueryResponse::rows(vec![row]));
        let query = QueryBuilder::new("users")
            .with_transport(transport.clone())
            .where_eq("status", "active")
            .limit(10);

        let response = query.execute().await.unwrap();
        assert_eq!(response.data.len(), 1);

        let requests = transport.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].target(), "/users?filter=%7B%22status%22%3A%22active%22%7D&limit=10");
    }

    #[tokio::test]
    async fn test_remote_error_field_is_raised() {
        let transport = RecordingTransport::new(QueryResponse {
            error: Some("boom".to_string()),
            ..QueryResponse::default()
        });
        let err = QueryBuilder::new("users")
            .with_transport(transport)
            .execute()
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(REMOTE_ERROR));
    }

    #[tokio::test]
    async fn test_fetch_params_flags_request() {
        let mut echoed = QueryParams::new();
        echoed.limit = Some(5);
        let transport = RecordingTransport::new(QueryResponse {
            params: Some(echoed.clone()),
            ..QueryResponse::default()
        });

        let params = QueryBuilder::new("users")
            .with_transport(transport.clone())
            .limit(5)
            .fetch_params()
            .await
            .unwrap();
        assert_eq!(params, echoed);
        assert_eq!(transport.requests.lock().await[0].query_string(), "limit=5&paramsOnly=true");
    }

    #[tokio::test]
    async fn test_fetch_params_requires_echo() {
        let transport = RecordingTransport::new(QueryResponse::default());
        let err = QueryBuilder::new("users")
            .with_transport(transport)
            .fetch_params()
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_empty_payload_never_reaches_transport() {
        let transport = RecordingTransport::new(QueryResponse::default());
        let query = QueryBuilder::new("users").with_transport(transport.clone());

        assert!(query.create(Payload::new()).await.unwrap_err().is_validation());
        assert!(query.update(7, Payload::new()).await.unwrap_err().is_validation());
        assert!(transport.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_update_bodies() {
        let transport = RecordingTransport::new(QueryResponse {
            id: Some(3),
            ..QueryResponse::default()
        });
        let query = QueryBuilder::new("users").with_transport(transport.clone());

        let created = query.create(payload(&[("name", "Ada")])).await.unwrap();
        assert_eq!(created.id, Some(3));

        let scoped = query.clone().where_eq("tenant", "acme");
        scoped.update(42, payload(&[("name", "Grace")])).await.unwrap();

        let requests = transport.requests.lock().await;
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "/users");
        assert_eq!(requests[0].body, Some(json!({"data": {"name": "Ada"}})));
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(requests[1].path, "/users/42");
        assert_eq!(
            requests[1].body,
            Some(json!({"filter": {"tenant": "acme"}, "data": {"name": "Grace"}}))
        );
    }

    #[tokio::test]
    async fn test_delete_body_only_when_params_present() {
        let transport = RecordingTransport::new(QueryResponse::default());
        let query = QueryBuilder::new("users").with_transport(transport.clone());

        query.delete(1).await.unwrap();
        query.clone().where_eq("tenant", "acme").delete("2").await.unwrap();

        let requests = transport.requests.lock().await;
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].body, None);
        assert_eq!(requests[1].body, Some(json!({"filter": {"tenant": "acme"}})));
    }
}
