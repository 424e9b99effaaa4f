//! HTTP transport layer for the Helix API.
//!
//! Provides low-level HTTP communication, including request building,
//! error mapping and response decoding.

use crate::errors::{EventSubError, EventSubResult, NetworkError, RateLimitError, ResponseError};
use crate::observability::redact_url;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// HTTP transport trait for making API requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request; non-success statuses are returned as errors
    async fn send(&self, request: TransportRequest) -> EventSubResult<TransportResponse>;
}

/// Transport request with an optional JSON body
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Full URL including query string
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<serde_json::Value>,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Create a new GET request
    pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers,
            body: None,
            timeout: None,
        }
    }

    /// Create a new POST request
    pub fn post(url: impl Into<String>, headers: HeaderMap, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers,
            body: Some(body),
            timeout: None,
        }
    }

    /// Create a new DELETE request
    pub fn delete(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            headers,
            body: None,
            timeout: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Successful transport response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Raw body
    pub body: Bytes,
}

impl TransportResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> EventSubResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| EventSubError::Response(ResponseError::from(e)))
    }
}

/// Error body returned by the Helix API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-success response to an error
pub(crate) fn error_from_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> EventSubError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return EventSubError::RateLimit(RateLimitError::RateLimited {
            retry_after: retry_after_from_headers(headers),
        });
    }

    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message);

    EventSubError::from_api_error(status.as_u16(), message.as_deref())
}

/// `Ratelimit-Reset` is an epoch timestamp at which the bucket refills
fn retry_after_from_headers(headers: &HeaderMap) -> Duration {
    headers
        .get("Ratelimit-Reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map(|reset| {
            let now = chrono::Utc::now().timestamp();
            Duration::from_secs(reset.saturating_sub(now).max(1) as u64)
        })
        .unwrap_or(Duration::from_secs(crate::DEFAULT_RATE_LIMIT_RETRY_SECS))
}

/// Default HTTP transport implementation using reqwest
pub struct ReqwestTransport {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout
    pub fn new(timeout: Duration) -> EventSubResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| EventSubError::Network(NetworkError::Http(e.to_string())))?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Create a new transport with a pre-built client
    pub fn with_client(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    async fn read_response(&self, response: Response) -> EventSubResult<TransportResponse> {
        let status = response.status();
        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| EventSubError::Network(NetworkError::from(e)))?;

        if !status.is_success() {
            warn!(status = %status, "Request failed with non-success status");
            return Err(error_from_response(status, &headers, &body));
        }

        debug!(status = %status, body_len = body.len(), "Received response");
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %redact_url(&request.url)))]
    async fn send(&self, request: TransportRequest) -> EventSubResult<TransportResponse> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(timeout);

        if let Some(body) = &request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| EventSubError::Network(NetworkError::from(e)))?;

        self.read_response(response).await
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
