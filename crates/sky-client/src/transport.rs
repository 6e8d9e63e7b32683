//! Transports
//!
//! A [`Transport`] performs one request and returns the server's API
//! envelope. It knows nothing about outcomes or state; classification
//! happens in the [`Dispatcher`](crate::Dispatcher).

use crate::config::ApiConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sky_protocol::{ApiRequest, Resolution, Verb};
use std::time::Duration;

/// Message used when an error envelope carries none
const MISSING_ERROR_MESSAGE: &str = "Unknown error";

/// `status` field of an API envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
}

/// Body of every API response: `{"status": ..., "data": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ApiStatus,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    /// Success envelope
    #[inline]
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self {
            status: ApiStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    /// Error envelope
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Classify into an outcome
    #[must_use]
    pub fn into_resolution(self) -> Resolution {
        match self.status {
            ApiStatus::Success => Resolution::Ok(self.data.unwrap_or(Value::Null)),
            ApiStatus::Error => Resolution::ApplicationError(
                self.message
                    .unwrap_or_else(|| MISSING_ERROR_MESSAGE.to_string()),
            ),
        }
    }
}

/// Performs one request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send request, return the parsed API envelope
    ///
    /// # Errors
    /// Any failure to obtain a well-formed envelope.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// HTTP transport over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    /// Create transport from API settings
    ///
    /// # Errors
    /// - `TransportError::Network` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            timeout,
        })
    }

    /// Absolute URL for an API path
    #[inline]
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn method(verb: Verb) -> Method {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }

    fn classify(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::method(request.verb), self.url(&request.path));
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("token {token}"));
        }
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(|e| self.classify(&e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(&e))?;

        // Error statuses still count as answers when the body is an envelope
        serde_json::from_slice::<ApiResponse>(&body).map_err(|e| {
            TransportError::MalformedResponse {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_parses() {
        let body = r#"{"status": "success", "data": {"id": "S1"}}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_resolution(),
            Resolution::Ok(json!({"id": "S1"}))
        );
    }

    #[test]
    fn success_without_data_is_null() {
        let response: ApiResponse = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(response.into_resolution(), Resolution::Ok(Value::Null));
    }

    #[test]
    fn error_envelope_keeps_message() {
        let body = r#"{"status": "error", "message": "Source not found", "data": {}}"#;
        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_resolution(),
            Resolution::ApplicationError("Source not found".into())
        );
    }

    #[test]
    fn error_envelope_without_message() {
        let response: ApiResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert_eq!(
            response.into_resolution(),
            Resolution::ApplicationError(MISSING_ERROR_MESSAGE.into())
        );
    }

    #[test]
    fn unknown_status_is_malformed() {
        assert!(serde_json::from_str::<ApiResponse>(r#"{"status": "pending"}"#).is_err());
        assert!(serde_json::from_str::<ApiResponse>("<html>502</html>").is_err());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/".into(),
            ..ApiConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.url("/api/sources/S1"),
            "http://localhost:5000/api/sources/S1"
        );
    }

    /// Serves one canned HTTP response, returns the base URL and the raw request head
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: {content_type}\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (base_url, server)
    }

    fn transport_for(base_url: String) -> HttpTransport {
        let config = ApiConfig {
            base_url,
            token: Some("abc123".into()),
            request_timeout_secs: 5,
            ..ApiConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn error_status_with_envelope_is_answer() {
        let (base_url, server) = serve_once(
            "404 Not Found",
            "application/json",
            r#"{"status": "error", "message": "Source not found"}"#,
        )
        .await;
        let transport = transport_for(base_url);
        let request = ApiRequest::get(
            "/api/sources/S1",
            sky_protocol::action::FETCH_LOADED_SOURCE,
        );

        let response = transport.send(&request).await.unwrap();
        assert_eq!(response, ApiResponse::error("Source not found"));

        let head = server.await.unwrap();
        assert!(head.starts_with("get /api/sources/s1 "), "{head}");
        assert!(head.contains("authorization: token abc123"), "{head}");
    }

    #[tokio::test]
    async fn success_status_with_html_is_malformed() {
        let (base_url, server) =
            serve_once("200 OK", "text/html", "<html>maintenance</html>").await;
        let transport = transport_for(base_url);
        let request = ApiRequest::get("/api/sysinfo", sky_protocol::action::FETCH_SYSINFO);

        let result = transport.send(&request).await;
        assert!(
            matches!(result, Err(TransportError::MalformedResponse { status: 200, .. })),
            "{result:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..ApiConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let request = ApiRequest::get("/api/sysinfo", sky_protocol::action::FETCH_SYSINFO);

        let result = transport.send(&request).await;
        assert!(matches!(
            result,
            Err(TransportError::Network(_) | TransportError::Timeout { .. })
        ));
    }
}
