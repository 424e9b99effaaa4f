//! Response types for the EventSub subscriptions endpoint.

use crate::subscriptions::SubscriptionSpec;
use crate::types::{condition_value_to_string, deserialize_version, TransportInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of an active subscription
pub const STATUS_ENABLED: &str = "enabled";

/// Status of a subscription awaiting the challenge handshake
pub const STATUS_VERIFICATION_PENDING: &str = "webhook_callback_verification_pending";

/// A subscription as stored by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Subscription ID
    pub id: String,
    /// Subscription status
    pub status: String,
    /// Event type
    #[serde(rename = "type")]
    pub subscription_type: String,
    /// Schema version
    #[serde(deserialize_with = "deserialize_version")]
    pub version: String,
    /// Condition parameters
    #[serde(default)]
    pub condition: Map<String, Value>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Delivery transport
    pub transport: TransportInfo,
    /// Cost against the subscription budget
    #[serde(default)]
    pub cost: u64,
}

impl SubscriptionRecord {
    /// Whether the subscription is live or about to be
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ENABLED || self.status == STATUS_VERIFICATION_PENDING
    }

    /// Whether this record already fulfils `spec` for `callback`
    pub fn matches(&self, spec: &SubscriptionSpec, callback: &str) -> bool {
        self.subscription_type == spec.event_type()
            && self.version == spec.version()
            && self.transport.is_webhook_to(callback)
            && self.condition.len() == spec.condition().len()
            && spec.condition().iter().all(|(key, value)| {
                self.condition
                    .get(key)
                    .map(|v| condition_value_to_string(v) == *value)
                    .unwrap_or(false)
            })
    }
}

/// Response from creating a subscription
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionResponse {
    /// Created subscription (a single element)
    pub data: Vec<SubscriptionRecord>,
    /// Total subscriptions
    #[serde(default)]
    pub total: u64,
    /// Total cost
    #[serde(default)]
    pub total_cost: u64,
    /// Cost budget
    #[serde(default)]
    pub max_total_cost: u64,
}

/// Pagination cursor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Cursor for the next page
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Response from listing subscriptions
#[derive(Debug, Clone, Deserialize)]
pub struct ListSubscriptionsResponse {
    /// Subscriptions on this page
    pub data: Vec<SubscriptionRecord>,
    /// Total subscriptions
    #[serde(default)]
    pub total: u64,
    /// Total cost
    #[serde(default)]
    pub total_cost: u64,
    /// Cost budget
    #[serde(default)]
    pub max_total_cost: u64,
    /// Pagination info
    #[serde(default)]
    pub pagination: Pagination,
}

impl ListSubscriptionsResponse {
    /// Cursor for the next page, if there is one
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination.cursor.as_deref().filter(|c| !c.is_empty())
    }
}
