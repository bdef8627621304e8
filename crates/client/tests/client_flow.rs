//! Integration tests for the client facade over a recording transport

use std::sync::Arc;

use async_trait::async_trait;
use tabula_client::Client;
use tabula_client::tabula_query::{
    Method, Operator, Payload, QueryError, QueryResponse, QueryResult, Row, Transport, TransportRequest, Value,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct MockTransport {
    requests: RwLock<Vec<TransportRequest>>,
    fail_with: Option<QueryError>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> QueryResult<QueryResponse> {
        self.requests.write().await.push(request);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => {
                let row: Row = [("id".to_string(), Value::from(1)), ("name".to_string(), Value::from("Ada"))]
                    .into_iter()
                    .collect();
                Ok(QueryResponse::rows(vec![row]))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[tokio::test]
async fn test_table_queries_go_through_client_transport() {
    let transport = Arc::new(MockTransport::default());
    let client = Client::new(transport.clone());

    let response = client
        .table("users")
        .where_op("age", Operator::GreaterThanOrEqual, 18)
        .select(&["id", "name"])
        .execute()
        .await
        .unwrap();

    assert_eq!(response.data[0]["name"], Value::from("Ada"));

    let requests = transport.requests.read().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path, "/users");
    assert!(requests[0].query_string().starts_with("select=%5B%22id%22%2C%22name%22%5D&whereRaw="));
}

#[tokio::test]
async fn test_transport_errors_propagate_unchanged() {
    let transport = Arc::new(MockTransport {
        fail_with: Some(QueryError::transport("service unavailable", "HTTP_STATUS", Some(503))),
        ..MockTransport::default()
    });
    let client = Client::new(transport.clone());

    let err = client.table("users").execute().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(transport.requests.read().await.len(), 1);
}

#[tokio::test]
async fn test_validation_happens_before_transport() {
    let transport = Arc::new(MockTransport::default());
    let client = Client::new(transport.clone());

    let err = client.table("users").create(Payload::new()).await.unwrap_err();
    assert!(err.is_validation());
    assert!(transport.requests.read().await.is_empty());
}
