//! Parsed EventSub notification envelopes.
//!
//! An [`EventEnvelope`] is built fresh for every inbound notification or
//! revocation and handed to the consumer by value.

use crate::errors::WebhookError;
use crate::types::{deserialize_version, TransportInfo};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status the remote side reports for a revoked subscription
pub const REVOKED_STATUS: &str = "revoked";

/// Subscription metadata carried by every notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    /// Subscription ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event type, e.g. `channel.follow`
    #[serde(rename = "type", default)]
    pub subscription_type: String,
    /// Schema version
    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: String,
    /// Subscription status
    #[serde(default)]
    pub status: String,
    /// Condition parameters
    #[serde(default)]
    pub condition: Map<String, Value>,
    /// Delivery transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportInfo>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Cost against the subscription budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    subscription: SubscriptionInfo,
    #[serde(default)]
    event: Option<Map<String, Value>>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// A delivered notification: subscription metadata, payload and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    subscription: SubscriptionInfo,
    event: Map<String, Value>,
    timestamp: Option<DateTime<Utc>>,
}

impl EventEnvelope {
    /// Parse an envelope from a raw JSON body
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Build an envelope from an already-parsed JSON value
    ///
    /// The value must be an object. A `timestamp` field, when present,
    /// must be an RFC 3339 string.
    pub fn from_value(value: Value) -> Result<Self, WebhookError> {
        if !value.is_object() {
            return Err(WebhookError::InvalidPayload {
                message: "payload must be a JSON object".to_string(),
            });
        }

        let raw: RawEnvelope = serde_json::from_value(value)?;

        let timestamp = raw
            .timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(Self {
            subscription: raw.subscription,
            event: raw.event.unwrap_or_default(),
            timestamp,
        })
    }

    /// Fill in the event type when the body did not carry one
    pub(crate) fn with_fallback_type(mut self, event_type: Option<&str>) -> Self {
        if self.subscription.subscription_type.is_empty() {
            if let Some(event_type) = event_type {
                self.subscription.subscription_type = event_type.to_string();
            }
        }
        self
    }

    /// Event type, e.g. `channel.follow`
    pub fn event_type(&self) -> &str {
        &self.subscription.subscription_type
    }

    /// Subscription schema version
    pub fn version(&self) -> &str {
        &self.subscription.version
    }

    /// Subscription status
    pub fn status(&self) -> &str {
        &self.subscription.status
    }

    /// Subscription condition parameters
    pub fn condition(&self) -> &Map<String, Value> {
        &self.subscription.condition
    }

    /// A condition parameter as a string
    pub fn condition_str(&self, key: &str) -> Option<&str> {
        self.subscription.condition.get(key).and_then(Value::as_str)
    }

    /// Subscription ID, if sent
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription.id.as_deref()
    }

    /// Full subscription metadata
    pub fn subscription(&self) -> &SubscriptionInfo {
        &self.subscription
    }

    /// Event payload; empty for revocations
    pub fn event(&self) -> &Map<String, Value> {
        &self.event
    }

    /// A payload field as a string
    pub fn event_str(&self, key: &str) -> Option<&str> {
        self.event.get(key).and_then(Value::as_str)
    }

    /// Decode the payload into a typed event
    pub fn deserialize_event<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        Ok(serde_json::from_value(Value::Object(self.event.clone()))?)
    }

    /// Delivery timestamp, if the body carried one
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Whether the subscription has been revoked
    pub fn is_revoked(&self) -> bool {
        self.subscription.status == REVOKED_STATUS
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, WebhookError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| WebhookError::InvalidPayload {
            message: format!("invalid timestamp {:?}: {}", raw, e),
        })
}
