//! EventSub subscriptions service implementation.

use super::*;
use crate::auth::AuthManager;
use crate::config::EventSubConfig;
use crate::errors::{ConfigurationError, EventSubResult, ResponseError};
use crate::resilience::{with_retry, CreateRetryPolicy, DefaultRetryPolicy, RetryConfig};
use crate::transport::{HttpTransport, TransportRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

const SUBSCRIPTIONS_ENDPOINT: &str = "eventsub/subscriptions";

/// Remote subscription management operations
#[async_trait]
pub trait EventSubApi: Send + Sync {
    /// Create a webhook subscription
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> EventSubResult<SubscriptionRecord>;

    /// List one page of subscriptions
    async fn list_subscriptions(
        &self,
        request: ListSubscriptionsRequest,
    ) -> EventSubResult<ListSubscriptionsResponse>;

    /// Delete a subscription by ID
    async fn delete_subscription(&self, id: &str) -> EventSubResult<()>;
}

/// EventSub service backed by an HTTP transport
pub struct EventSubService {
    transport: Arc<dyn HttpTransport>,
    auth: AuthManager,
    config: Arc<EventSubConfig>,
    retry: RetryConfig,
}

impl EventSubService {
    /// Create a new EventSub service
    pub fn new(transport: Arc<dyn HttpTransport>, auth: AuthManager, config: Arc<EventSubConfig>) -> Self {
        let retry = RetryConfig::from_config(&config);
        Self {
            transport,
            auth,
            config,
            retry,
        }
    }

    /// Override the retry behaviour
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_url(&self, params: &[(&str, &str)]) -> EventSubResult<String> {
        let base = self.config.build_url(SUBSCRIPTIONS_ENDPOINT);
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        }
        .map_err(|e| ConfigurationError::InvalidConfiguration {
            message: format!("Invalid API URL: {}", e),
        })?;
        Ok(url.into())
    }
}

#[async_trait]
impl EventSubApi for EventSubService {
    #[instrument(skip(self, request), fields(subscription_type = %request.subscription_type, version = %request.version))]
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> EventSubResult<SubscriptionRecord> {
        let url = self.build_url(&[])?;
        let headers = self.auth.get_headers()?;
        let body = serde_json::to_value(&request).map_err(ResponseError::from)?;
        let transport = self.transport.clone();
        let timeout = self.config.timeout;

        let response = with_retry("eventsub.subscriptions.create", &self.retry, &CreateRetryPolicy, || {
            let request = TransportRequest::post(url.clone(), headers.clone(), body.clone())
                .with_timeout(timeout);
            let transport = transport.clone();
            async move { transport.send(request).await }
        })
        .await?;

        let created: CreateSubscriptionResponse = response.json()?;
        let record = created.data.into_iter().next().ok_or_else(|| {
            ResponseError::UnexpectedResponse {
                message: "Create response contained no subscription".to_string(),
            }
        })?;

        debug!(subscription_id = %record.id, status = %record.status, "Subscription created");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_subscriptions(
        &self,
        request: ListSubscriptionsRequest,
    ) -> EventSubResult<ListSubscriptionsResponse> {
        let url = self.build_url(&request.query_pairs())?;
        let headers = self.auth.get_headers()?;
        let transport = self.transport.clone();
        let timeout = self.config.timeout;

        let response = with_retry("eventsub.subscriptions.list", &self.retry, &DefaultRetryPolicy, || {
            let request = TransportRequest::get(url.clone(), headers.clone()).with_timeout(timeout);
            let transport = transport.clone();
            async move { transport.send(request).await }
        })
        .await?;

        response.json()
    }

    #[instrument(skip(self))]
    async fn delete_subscription(&self, id: &str) -> EventSubResult<()> {
        let url = self.build_url(&[("id", id)])?;
        let headers = self.auth.get_headers()?;
        let transport = self.transport.clone();
        let timeout = self.config.timeout;

        with_retry("eventsub.subscriptions.delete", &self.retry, &DefaultRetryPolicy, || {
            let request = TransportRequest::delete(url.clone(), headers.clone()).with_timeout(timeout);
            let transport = transport.clone();
            async move { transport.send(request).await }
        })
        .await?;

        debug!("Subscription deleted");
        Ok(())
    }
}

impl std::fmt::Debug for EventSubService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubService")
            .field("base_url", &self.config.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
