//! Types shared by inbound envelopes and outbound API records.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Transport method used for webhook subscriptions
pub const WEBHOOK_METHOD: &str = "webhook";

/// Delivery transport of a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportInfo {
    /// Transport method (`webhook`, `websocket`, ...)
    pub method: String,
    /// Callback URL for webhook transports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

impl TransportInfo {
    /// Webhook transport pointing at `callback`
    pub fn webhook(callback: impl Into<String>) -> Self {
        Self {
            method: WEBHOOK_METHOD.to_string(),
            callback: Some(callback.into()),
        }
    }

    /// Whether this transport delivers to the given callback by webhook
    pub fn is_webhook_to(&self, callback: &str) -> bool {
        self.method == WEBHOOK_METHOD && self.callback.as_deref() == Some(callback)
    }
}

/// Deserialize a subscription version, keeping it a string
///
/// The remote side sends strings, but numbers are tolerated and
/// rendered verbatim so `"1"` and `1` both become `"1"`.
pub(crate) fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "invalid subscription version: {}",
            other
        ))),
    }
}

/// Render a condition value the way it is compared against declared specs
pub(crate) fn condition_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
