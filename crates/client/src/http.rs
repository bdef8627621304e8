//! HTTP transport for the remote query service using reqwest

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use tabula_query::{Method, QueryError, QueryResponse, QueryResult, Structural, Transport, TransportRequest};
use tracing::{debug, error, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ClientError, ClientResult};

pub const TIMEOUT: &str = "TIMEOUT";
pub const CONNECT: &str = "CONNECT";
pub const HTTP: &str = "HTTP";
pub const HTTP_STATUS: &str = "HTTP_STATUS";

/// [`Transport`] that talks JSON over HTTP
#[derive(Clone)]
pub struct HttpTransport {
    config: ClientConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(build_headers(&config)?)
            .build()
            .map_err(|e| ClientError::http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send_once(&self, url: &str, request: &TransportRequest) -> QueryResult<QueryResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(response_error(status, &text));
        }
        decode_body(&text)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> QueryResult<QueryResponse> {
        let url = endpoint(&self.config.base_url, &request);
        let mut attempt = 0;

        loop {
            debug!("HTTP {} {} (attempt {})", request.method, url, attempt + 1);
            match self.send_once(&url, &request).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.config.max_retries && is_retryable(request.method, &err) => {
                    attempt += 1;
                    warn!(
                        "Retrying {} {} after error: {} ({}/{})",
                        request.method, url, err, attempt, self.config.max_retries
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(err) => {
                    error!("HTTP {} {} failed: {}", request.method, url, err);
                    return Err(err);
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn build_headers(config: &ClientConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.headers {
        let invalid = || ConfigError::InvalidValue {
            field: "headers".to_string(),
            value: format!("{}: {}", name, value),
            expected: "a valid HTTP header".to_string(),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(name, value);
    }

    if let Some(api_key) = &config.api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| ConfigError::InvalidValue {
            field: "api_key".to_string(),
            value: "<redacted>".to_string(),
            expected: "a header-safe token".to_string(),
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Absolute URL for a request under `base_url`
pub fn endpoint(base_url: &str, request: &TransportRequest) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), request.target())
}

fn map_reqwest_error(err: reqwest::Error) -> QueryError {
    let status = err.status().map(|s| s.as_u16());
    let code = if err.is_timeout() {
        TIMEOUT
    } else if err.is_connect() {
        CONNECT
    } else {
        HTTP
    };
    QueryError::transport(err.to_string(), code, status)
}

/// Error for a non-success status, preferring the service's own message
fn response_error(status: StatusCode, body: &str) -> QueryError {
    let message = serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|json| {
            ["error", "message"]
                .iter()
                .find_map(|key| json.get(*key).and_then(JsonValue::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body.trim()));
    QueryError::transport(message, HTTP_STATUS, Some(status.as_u16()))
}

fn decode_body(body: &str) -> QueryResult<QueryResponse> {
    if body.trim().is_empty() {
        return Ok(QueryResponse::default());
    }
    let json: JsonValue = serde_json::from_str(body)?;
    QueryResponse::from_structure(&json)
}

/// A create is retried only when the connection never opened; a timeout or
/// 5xx may follow a write the service already applied.
fn is_retryable(method: Method, err: &QueryError) -> bool {
    if err.code() == Some(CONNECT) {
        return true;
    }
    match method {
        Method::Post => false,
        Method::Get | Method::Put | Method::Delete => {
            err.code() == Some(TIMEOUT) || err.status().map_or(false, |s| s >= 500)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tabula_query::{QueryBuilder, Value};

    #[test]
    fn test_endpoint_joins_base_and_target() {
        let params = QueryBuilder::new("users").limit(10).to_params();
        let request = TransportRequest::read("users", &params);
        assert_eq!(endpoint("https://api.example.com/v1/", &request), "https://api.example.com/v1/users?limit=10");
        assert_eq!(endpoint("https://api.example.com", &request), "https://api.example.com/users?limit=10");
    }

    #[test]
    fn test_response_error_prefers_service_message() {
        let err = response_error(StatusCode::BAD_REQUEST, r#"{"error": "unknown column 'x'"}"#);
        assert_eq!(err.code(), Some(HTTP_STATUS));
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("unknown column 'x'"));

        let err = response_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("HTTP 502 Bad Gateway: upstream down"));
    }

    #[test]
    fn test_retry_policy() {
        for method in [Method::Get, Method::Put, Method::Delete] {
            assert!(is_retryable(method, &QueryError::transport("t", TIMEOUT, None)));
            assert!(is_retryable(method, &QueryError::transport("c", CONNECT, None)));
            assert!(is_retryable(method, &QueryError::transport("s", HTTP_STATUS, Some(503))));
            assert!(!is_retryable(method, &QueryError::transport("s", HTTP_STATUS, Some(404))));
            assert!(!is_retryable(method, &QueryError::validation("nope")));
        }
    }

    #[test]
    fn test_create_is_retried_only_on_connect_errors() {
        assert!(is_retryable(Method::Post, &QueryError::transport("c", CONNECT, None)));
        assert!(!is_retryable(Method::Post, &QueryError::transport("t", TIMEOUT, None)));
        assert!(!is_retryable(Method::Post, &QueryError::transport("s", HTTP_STATUS, Some(503))));
        assert!(!is_retryable(Method::Post, &QueryError::transport("s", HTTP_STATUS, Some(500))));
    }

    /// Serves `503` to every request on a local port and counts the requests
    fn unavailable_service() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut length = 0;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }
                let mut body = vec![0; length];
                let _ = reader.read_exact(&mut body);
                counter.fetch_add(1, Ordering::SeqCst);

                let payload = r#"{"error": "service unavailable"}"#;
                let _ = write!(
                    stream,
                    "HTTP/1.1 503 Service Unavailable\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
            }
        });

        (base_url, hits)
    }

    fn transport_for(base_url: &str) -> HttpTransport {
        let mut config = ClientConfig::new(base_url);
        config.max_retries = 2;
        config.retry_delay_ms = 1;
        HttpTransport::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_create_is_sent_once_on_server_error() {
        let (base_url, hits) = unavailable_service();
        let transport = transport_for(&base_url);

        let err = transport
            .send(TransportRequest::create("users", serde_json::json!({"data": {"name": "Ada"}})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("service unavailable"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_is_retried_on_server_error() {
        let (base_url, hits) = unavailable_service();
        let transport = transport_for(&base_url);

        let err = transport
            .send(TransportRequest::read("users", &Default::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body("").unwrap(), QueryResponse::default());

        let response = decode_body(r#"{"data": [{"id": 1}], "message": "ok"}"#).unwrap();
        assert_eq!(response.data[0]["id"], Value::from(1));
        assert_eq!(response.message.as_deref(), Some("ok"));

        assert!(decode_body("not json").unwrap_err().is_format());
    }

    #[test]
    fn test_invalid_header_is_a_config_error() {
        let config = ClientConfig::new("https://example.com").with_header("Bad Header", "x");
        assert!(matches!(
            HttpTransport::new(config),
            Err(ClientError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_reports_connect_error() {
        let mut config = ClientConfig::new("http://127.0.0.1:9");
        config.max_retries = 1;
        config.retry_delay_ms = 1;
        let transport = HttpTransport::new(config).unwrap();

        let err = transport
            .send(TransportRequest::read("users", &Default::default()))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.code(), Some(CONNECT));
    }
}
