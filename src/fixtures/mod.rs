//! Test fixtures for EventSub webhook deliveries and API records.
//!
//! Provides realistic payloads and correctly signed requests for unit tests.

use crate::services::eventsub::{SubscriptionRecord, STATUS_ENABLED};
use crate::types::TransportInfo;
use crate::webhooks::{
    compute_signature, WebhookRequest, HEADER_MESSAGE_ID, HEADER_MESSAGE_SIGNATURE,
    HEADER_MESSAGE_TIMESTAMP, HEADER_MESSAGE_TYPE, HEADER_SUBSCRIPTION_TYPE,
};
use chrono::{SecondsFormat, Utc};
use http::{HeaderMap, HeaderValue};
use serde_json::{json, Map, Value};

/// Callback URL used across fixtures
pub const CALLBACK_URL: &str = "https://example.com/webhooks/twitch";

/// Secret used across fixtures
pub const SECRET: &str = "s3cRe7-s3cRe7-s3cRe7";

/// Build a request signed with `secret` and stamped with the current time
pub fn signed_request(
    secret: &str,
    message_type: &str,
    subscription_type: Option<&str>,
    body: &[u8],
) -> WebhookRequest {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    signed_request_at(secret, message_type, subscription_type, body, &timestamp)
}

/// Build a request signed with `secret` for an explicit timestamp
pub fn signed_request_at(
    secret: &str,
    message_type: &str,
    subscription_type: Option<&str>,
    body: &[u8],
    timestamp: &str,
) -> WebhookRequest {
    let message_id = uuid::Uuid::new_v4().to_string();
    let signature = compute_signature(secret.as_bytes(), &message_id, timestamp, body);

    let mut headers = HeaderMap::new();
    insert(&mut headers, HEADER_MESSAGE_ID, &message_id);
    insert(&mut headers, HEADER_MESSAGE_TIMESTAMP, timestamp);
    insert(&mut headers, HEADER_MESSAGE_SIGNATURE, &signature);
    insert(&mut headers, HEADER_MESSAGE_TYPE, message_type);
    if let Some(subscription_type) = subscription_type {
        insert(&mut headers, HEADER_SUBSCRIPTION_TYPE, subscription_type);
    }

    WebhookRequest::new(headers, body.to_vec())
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    headers.insert(name, HeaderValue::from_str(value).unwrap());
}

/// Subscription object as embedded in deliveries
pub fn subscription_json(subscription_type: &str, status: &str) -> Value {
    json!({
        "id": "f1c2a387-161a-49f9-a165-0f21d7a4e1c4",
        "type": subscription_type,
        "version": "1",
        "status": status,
        "cost": 0,
        "condition": { "broadcaster_user_id": "12826" },
        "transport": { "method": "webhook", "callback": CALLBACK_URL },
        "created_at": "2019-11-16T10:11:12.634234626Z"
    })
}

/// Callback verification body carrying `challenge`
pub fn verification_body(challenge: &str) -> Vec<u8> {
    json!({
        "challenge": challenge,
        "subscription": subscription_json("channel.follow", "webhook_callback_verification_pending")
    })
    .to_string()
    .into_bytes()
}

/// Notification body for a `channel.follow` event
pub fn follow_notification_body() -> Vec<u8> {
    json!({
        "subscription": subscription_json("channel.follow", "enabled"),
        "event": {
            "user_id": "1337",
            "user_login": "awesome_user",
            "user_name": "Awesome_User",
            "broadcaster_user_id": "12826",
            "broadcaster_user_login": "twitch",
            "broadcaster_user_name": "Twitch",
            "followed_at": "2020-07-15T18:16:11.17106713Z"
        }
    })
    .to_string()
    .into_bytes()
}

/// Notification body with an arbitrary event object
pub fn notification_body(subscription_type: &str, event: Value) -> Vec<u8> {
    json!({
        "subscription": subscription_json(subscription_type, "enabled"),
        "event": event
    })
    .to_string()
    .into_bytes()
}

/// Revocation body with the given status
pub fn revocation_body(subscription_type: &str, status: &str) -> Vec<u8> {
    json!({ "subscription": subscription_json(subscription_type, status) })
        .to_string()
        .into_bytes()
}

/// An enabled subscription record pointing at [`CALLBACK_URL`]
pub fn subscription_record(id: &str, subscription_type: &str, condition: &[(&str, &str)]) -> SubscriptionRecord {
    let condition: Map<String, Value> = condition
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

    SubscriptionRecord {
        id: id.to_string(),
        status: STATUS_ENABLED.to_string(),
        subscription_type: subscription_type.to_string(),
        version: "1".to_string(),
        condition,
        created_at: Some(Utc::now()),
        transport: TransportInfo::webhook(CALLBACK_URL),
        cost: 1,
    }
}
