//! Webhook dispatcher tests.

use crate::events::EventEnvelope;
use crate::fixtures::{self, SECRET};
use crate::webhooks::{
    EventHandler, FnHandler, SignatureVerifier, WebhookDispatcher, WebhookRequest, WebhookResponse,
};
use http::StatusCode;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;

#[derive(Default)]
struct Recorded {
    events: Mutex<Vec<(String, EventEnvelope)>>,
    revocations: Mutex<Vec<EventEnvelope>>,
}

fn dispatcher() -> (WebhookDispatcher, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let events = recorded.clone();
    let revocations = recorded.clone();

    let handler = FnHandler::builder()
        .on_event(move |event_type, envelope| {
            events.events.lock().push((event_type.to_string(), envelope));
        })
        .on_revocation(move |envelope| {
            revocations.revocations.lock().push(envelope);
        })
        .build()
        .unwrap();

    let verifier = SignatureVerifier::new(SecretString::new(SECRET.to_string()));
    (WebhookDispatcher::new(verifier, Arc::new(handler)), recorded)
}

fn call_count(recorded: &Recorded) -> usize {
    recorded.events.lock().len() + recorded.revocations.lock().len()
}

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "webhook_callback_verification",
        Some("channel.follow"),
        &fixtures::verification_body("abc123"),
    );

    let response = dispatcher.handle(&request).await.unwrap();

    assert_eq!(response, WebhookResponse::Challenge("abc123".to_string()));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), Some("abc123"));
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_notification_dispatched_once() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "notification",
        Some("channel.follow"),
        &fixtures::follow_notification_body(),
    );

    let response = dispatcher.handle(&request).await.unwrap();
    assert_eq!(response, WebhookResponse::NoContent);

    let events = recorded.events.lock();
    assert_eq!(events.len(), 1);
    let (event_type, envelope) = &events[0];
    assert_eq!(event_type, "channel.follow");
    assert_eq!(envelope.event_type(), "channel.follow");
    assert_eq!(envelope.event_str("user_login"), Some("awesome_user"));
    assert!(recorded.revocations.lock().is_empty());
}

#[tokio::test]
async fn test_notification_type_taken_from_header_when_body_omits_it() {
    let (dispatcher, recorded) = dispatcher();
    let body = json!({
        "subscription": { "version": "1", "status": "enabled", "condition": {} },
        "event": { "broadcaster_user_id": "12826" }
    })
    .to_string();
    let request = fixtures::signed_request(SECRET, "notification", Some("stream.online"), body.as_bytes());

    dispatcher.handle(&request).await.unwrap();

    let events = recorded.events.lock();
    assert_eq!(events[0].0, "stream.online");
    assert_eq!(events[0].1.event_type(), "stream.online");
}

#[tokio::test]
async fn test_message_type_header_is_case_insensitive() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "Notification",
        Some("channel.follow"),
        &fixtures::follow_notification_body(),
    );

    dispatcher.handle(&request).await.unwrap();
    assert_eq!(recorded.events.lock().len(), 1);
}

#[tokio::test]
async fn test_revocation_dispatched() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "revocation",
        Some("channel.follow"),
        &fixtures::revocation_body("channel.follow", "revoked"),
    );

    let response = dispatcher.handle(&request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let revocations = recorded.revocations.lock();
    assert_eq!(revocations.len(), 1);
    assert!(revocations[0].is_revoked());
    assert!(recorded.events.lock().is_empty());
}

#[tokio::test]
async fn test_revocation_for_other_reason_is_not_revoked() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "revocation",
        Some("channel.follow"),
        &fixtures::revocation_body("channel.follow", "user_removed"),
    );

    dispatcher.handle(&request).await.unwrap();

    let revocations = recorded.revocations.lock();
    assert_eq!(revocations[0].status(), "user_removed");
    assert!(!revocations[0].is_revoked());
}

#[tokio::test]
async fn test_unrecognized_type_acknowledged_without_dispatch() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        SECRET,
        "keepalive",
        None,
        &fixtures::follow_notification_body(),
    );

    let response = dispatcher.handle(&request).await.unwrap();

    assert_eq!(response, WebhookResponse::NoContent);
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_bad_signature_forbidden_without_dispatch() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(
        "another-secret-entirely",
        "notification",
        Some("channel.follow"),
        &fixtures::follow_notification_body(),
    );

    let response = dispatcher.handle(&request).await.unwrap();

    assert_eq!(response, WebhookResponse::Forbidden);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_tampered_body_forbidden() {
    let (dispatcher, recorded) = dispatcher();
    let signed = fixtures::signed_request(
        SECRET,
        "notification",
        Some("channel.follow"),
        &fixtures::follow_notification_body(),
    );
    let mut body = signed.body().to_vec();
    body[0] = b' ';
    let tampered = WebhookRequest::new(signed.headers().clone(), body);

    let response = dispatcher.handle(&tampered).await.unwrap();
    assert_eq!(response, WebhookResponse::Forbidden);
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_missing_headers_forbidden() {
    let (dispatcher, recorded) = dispatcher();
    let request = WebhookRequest::new(http::HeaderMap::new(), fixtures::follow_notification_body());

    let response = dispatcher.handle(&request).await.unwrap();
    assert_eq!(response, WebhookResponse::Forbidden);
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_malformed_json_is_an_error() {
    let (dispatcher, recorded) = dispatcher();
    let request = fixtures::signed_request(SECRET, "notification", Some("channel.follow"), b"{not json");

    let err = dispatcher.handle(&request).await.unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert_eq!(call_count(&recorded), 0);
}

#[tokio::test]
async fn test_non_object_body_is_an_error() {
    let (dispatcher, _) = dispatcher();
    let request = fixtures::signed_request(SECRET, "notification", Some("channel.follow"), b"[]");

    assert!(dispatcher.handle(&request).await.is_err());
}

#[tokio::test]
async fn test_verification_without_challenge_is_an_error() {
    let (dispatcher, _) = dispatcher();
    let body = json!({ "subscription": fixtures::subscription_json("channel.follow", "enabled") })
        .to_string();
    let request = fixtures::signed_request(
        SECRET,
        "webhook_callback_verification",
        None,
        body.as_bytes(),
    );

    let err = dispatcher.handle(&request).await.unwrap_err();
    assert_eq!(err.http_status(), Some(400));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_dispatcher() {
    let (dispatcher, recorded) = dispatcher();
    let dispatcher = Arc::new(dispatcher);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let request = fixtures::signed_request(
                    SECRET,
                    "notification",
                    Some("channel.follow"),
                    &fixtures::follow_notification_body(),
                );
                dispatcher.handle(&request).await.unwrap()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), WebhookResponse::NoContent);
    }
    assert_eq!(recorded.events.lock().len(), 8);
}

struct CountingHandler(Mutex<u32>);

#[async_trait::async_trait]
impl EventHandler for CountingHandler {
    async fn process_event(&self, _event_type: &str, _envelope: EventEnvelope) {
        *self.0.lock() += 1;
    }

    async fn process_revocation(&self, _envelope: EventEnvelope) {}
}

#[tokio::test]
async fn test_dispatcher_from_config_applies_replay_window() {
    let config = crate::EventSubConfig::builder()
        .secret(SECRET)
        .max_message_age(std::time::Duration::from_secs(600))
        .build_unchecked();
    let handler = Arc::new(CountingHandler(Mutex::new(0)));
    let dispatcher = WebhookDispatcher::from_config(&config, handler.clone()).unwrap();

    let stale = fixtures::signed_request_at(
        SECRET,
        "notification",
        Some("channel.follow"),
        &fixtures::follow_notification_body(),
        "2019-11-16T10:11:12.634234626Z",
    );
    assert_eq!(dispatcher.handle(&stale).await.unwrap(), WebhookResponse::Forbidden);
    assert_eq!(*handler.0.lock(), 0);
}

#[test]
fn test_dispatcher_from_config_requires_secret() {
    let config = crate::EventSubConfig::default();
    let handler = Arc::new(CountingHandler(Mutex::new(0)));
    assert!(WebhookDispatcher::from_config(&config, handler).is_err());
}
