//! Request types for the EventSub subscriptions endpoint.

use crate::observability::Redacted;
use crate::subscriptions::SubscriptionSpec;
use crate::types::WEBHOOK_METHOD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Webhook transport sent when creating a subscription
#[derive(Clone, Serialize)]
pub struct WebhookTransport {
    /// Always `webhook`
    pub method: String,
    /// Callback URL
    pub callback: String,
    /// Shared signing secret
    #[serde(serialize_with = "serialize_secret")]
    pub secret: SecretString,
}

impl WebhookTransport {
    /// Create a webhook transport
    pub fn new(callback: impl Into<String>, secret: SecretString) -> Self {
        Self {
            method: WEBHOOK_METHOD.to_string(),
            callback: callback.into(),
            secret,
        }
    }
}

impl std::fmt::Debug for WebhookTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookTransport")
            .field("method", &self.method)
            .field("callback", &self.callback)
            .field("secret", &Redacted::new(&self.secret))
            .finish()
    }
}

/// Request to create a subscription
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscriptionRequest {
    /// Event type
    #[serde(rename = "type")]
    pub subscription_type: String,
    /// Schema version
    pub version: String,
    /// Condition parameters
    pub condition: BTreeMap<String, String>,
    /// Delivery transport
    pub transport: WebhookTransport,
}

impl CreateSubscriptionRequest {
    /// Build a webhook subscription request from a declared spec
    pub fn webhook(spec: &SubscriptionSpec, callback: impl Into<String>, secret: SecretString) -> Self {
        Self {
            subscription_type: spec.event_type().to_string(),
            version: spec.version().to_string(),
            condition: spec.condition().clone(),
            transport: WebhookTransport::new(callback, secret),
        }
    }
}

/// Request to list subscriptions
#[derive(Debug, Clone, Default)]
pub struct ListSubscriptionsRequest {
    /// Filter by status
    pub status: Option<String>,
    /// Filter by event type
    pub subscription_type: Option<String>,
    /// Filter by user ID in the condition
    pub user_id: Option<String>,
    /// Pagination cursor
    pub after: Option<String>,
}

impl ListSubscriptionsRequest {
    /// Create an unfiltered list request
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filter by event type
    pub fn subscription_type(mut self, subscription_type: impl Into<String>) -> Self {
        self.subscription_type = Some(subscription_type.into());
        self
    }

    /// Filter by user ID
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Continue from a pagination cursor
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Query parameters for this request
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str()));
        }
        if let Some(subscription_type) = &self.subscription_type {
            pairs.push(("type", subscription_type.as_str()));
        }
        if let Some(user_id) = &self.user_id {
            pairs.push(("user_id", user_id.as_str()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.as_str()));
        }
        pairs
    }
}
