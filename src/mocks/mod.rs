//! Mock implementations for testing.
//!
//! Provides a scripted HTTP transport and a recording EventSub API for
//! London-School TDD.

use crate::errors::{EventSubError, EventSubResult, NetworkError, ResponseError};
use crate::services::eventsub::{
    CreateSubscriptionRequest, EventSubApi, ListSubscriptionsRequest, ListSubscriptionsResponse,
    Pagination, SubscriptionRecord, STATUS_VERIFICATION_PENDING,
};
use crate::transport::{error_from_response, HttpTransport, TransportRequest, TransportResponse};
use crate::types::TransportInfo;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock response configuration
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
    /// Response headers
    pub headers: HeaderMap,
    /// Delay before response
    pub delay_ms: Option<u64>,
    /// Fail with a timeout instead of responding
    pub timeout: bool,
}

impl MockResponse {
    /// Create a JSON response
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
            headers: HeaderMap::new(),
            delay_ms: None,
            timeout: false,
        }
    }

    /// Create a response with no body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            headers: HeaderMap::new(),
            delay_ms: None,
            timeout: false,
        }
    }

    /// Create a Helix error response
    pub fn error(status: u16, message: &str) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Error");
        Self::json(
            status,
            serde_json::json!({ "error": reason, "status": status, "message": message }),
        )
    }

    /// Create a rate limit response resetting `retry_after` seconds from now
    pub fn rate_limited(retry_after: u64) -> Self {
        let mut response = Self::error(429, "Too Many Requests");
        let reset = chrono::Utc::now().timestamp() + retry_after as i64;
        if let Ok(value) = reset.to_string().parse() {
            response.headers.insert("Ratelimit-Reset", value);
        }
        response
    }

    /// Simulate a request that never completes in time
    pub fn timed_out() -> Self {
        Self {
            timeout: true,
            ..Self::empty(0)
        }
    }

    /// Add delay to response
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }
}

/// Mock HTTP transport for testing
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockHttpTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response to the queue
    pub fn enqueue(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Add a response, builder style
    pub fn with_response(self, response: MockResponse) -> Self {
        self.enqueue(response);
        self
    }

    /// Get recorded requests
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Get the last recorded request
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    /// Get remaining response count
    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: TransportRequest) -> EventSubResult<TransportResponse> {
        self.requests.lock().push(request);

        let response = self.responses.lock().pop_front().ok_or_else(|| {
            EventSubError::Response(ResponseError::UnexpectedResponse {
                message: "No mock response configured".to_string(),
            })
        })?;

        if let Some(delay) = response.delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if response.timeout {
            return Err(NetworkError::Timeout.into());
        }

        let status = StatusCode::from_u16(response.status).map_err(|e| {
            EventSubError::Response(ResponseError::UnexpectedResponse {
                message: e.to_string(),
            })
        })?;

        if !status.is_success() {
            return Err(error_from_response(status, &response.headers, &response.body));
        }

        Ok(TransportResponse {
            status,
            body: response.body,
        })
    }
}

impl std::fmt::Debug for MockHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpTransport")
            .field("pending_responses", &self.responses.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum ScriptedFailure {
    Status { status: u16, message: String },
    Timeout,
}

impl ScriptedFailure {
    fn to_error(&self) -> EventSubError {
        match self {
            Self::Status { status, message } => {
                EventSubError::from_api_error(*status, Some(message.as_str()))
            }
            Self::Timeout => NetworkError::Timeout.into(),
        }
    }
}

/// Recording EventSub API double
///
/// Create calls succeed with a pending record unless a failure has been
/// scripted for the subscription type.
#[derive(Debug, Default)]
pub struct MockEventSubApi {
    created: Mutex<Vec<CreateSubscriptionRequest>>,
    deleted: Mutex<Vec<String>>,
    list_requests: Mutex<Vec<ListSubscriptionsRequest>>,
    failures: Mutex<HashMap<String, ScriptedFailure>>,
    pages: Mutex<VecDeque<ListSubscriptionsResponse>>,
    list_failure: Mutex<Option<ScriptedFailure>>,
    create_calls: AtomicUsize,
}

impl MockEventSubApi {
    /// Create a new mock API
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every create call for `subscription_type` with an API error
    pub fn fail_type(self, subscription_type: &str, status: u16, message: &str) -> Self {
        self.failures.lock().insert(
            subscription_type.to_string(),
            ScriptedFailure::Status {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    /// Time out every create call for `subscription_type`
    pub fn timeout_type(self, subscription_type: &str) -> Self {
        self.failures
            .lock()
            .insert(subscription_type.to_string(), ScriptedFailure::Timeout);
        self
    }

    /// Queue a page of existing subscriptions for list calls
    pub fn with_list_page(self, records: Vec<SubscriptionRecord>, cursor: Option<&str>) -> Self {
        let total = records.len() as u64;
        self.pages.lock().push_back(ListSubscriptionsResponse {
            data: records,
            total,
            total_cost: total,
            max_total_cost: 10_000,
            pagination: Pagination {
                cursor: cursor.map(str::to_string),
            },
        });
        self
    }

    /// Fail list calls with an API error
    pub fn fail_list(self, status: u16, message: &str) -> Self {
        *self.list_failure.lock() = Some(ScriptedFailure::Status {
            status,
            message: message.to_string(),
        });
        self
    }

    /// Create requests received, in order
    pub fn created(&self) -> Vec<CreateSubscriptionRequest> {
        self.created.lock().clone()
    }

    /// Event types of create requests received, in order
    pub fn created_types(&self) -> Vec<String> {
        self.created
            .lock()
            .iter()
            .map(|r| r.subscription_type.clone())
            .collect()
    }

    /// IDs passed to delete
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// List requests received, in order
    pub fn list_requests(&self) -> Vec<ListSubscriptionsRequest> {
        self.list_requests.lock().clone()
    }

    /// Number of create calls, including failed ones
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSubApi for MockEventSubApi {
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> EventSubResult<SubscriptionRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().get(&request.subscription_type).cloned();
        self.created.lock().push(request.clone());

        if let Some(failure) = failure {
            return Err(failure.to_error());
        }

        let condition: Map<String, Value> = request
            .condition
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        Ok(SubscriptionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            status: STATUS_VERIFICATION_PENDING.to_string(),
            subscription_type: request.subscription_type,
            version: request.version,
            condition,
            created_at: Some(chrono::Utc::now()),
            transport: TransportInfo::webhook(request.transport.callback),
            cost: 1,
        })
    }

    async fn list_subscriptions(
        &self,
        request: ListSubscriptionsRequest,
    ) -> EventSubResult<ListSubscriptionsResponse> {
        self.list_requests.lock().push(request);

        if let Some(failure) = self.list_failure.lock().as_ref() {
            return Err(failure.to_error());
        }

        Ok(self
            .pages
            .lock()
            .pop_front()
            .unwrap_or(ListSubscriptionsResponse {
                data: Vec::new(),
                total: 0,
                total_cost: 0,
                max_total_cost: 10_000,
                pagination: Pagination::default(),
            }))
    }

    async fn delete_subscription(&self, id: &str) -> EventSubResult<()> {
        self.deleted.lock().push(id.to_string());
        Ok(())
    }
}
