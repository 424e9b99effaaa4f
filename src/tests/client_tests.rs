//! Client wiring tests.

use crate::client::EventSubClient;
use crate::config::EventSubConfig;
use crate::fixtures::{self, CALLBACK_URL, SECRET};
use crate::mocks::{MockHttpTransport, MockResponse};
use crate::subscriptions::{SubscriptionRegistry, SubscriptionSpec};
use crate::webhooks::{FnHandler, WebhookResponse};
use http::Method;
use serde_json::json;
use std::sync::Arc;

fn config() -> EventSubConfig {
    EventSubConfig::builder()
        .secret(SECRET)
        .callback_url(CALLBACK_URL)
        .unwrap()
        .client_id("hof5gwx0su6owfnys0nyan9c87zr6t")
        .access_token("2gbdx6oar67tqtcmt49t3wpcgycthx")
        .max_retries(0)
        .build()
        .unwrap()
}

fn created(id: &str, subscription_type: &str) -> MockResponse {
    MockResponse::json(
        202,
        json!({
            "data": [{
                "id": id,
                "status": "webhook_callback_verification_pending",
                "type": subscription_type,
                "version": "1",
                "condition": { "broadcaster_user_id": "12826" },
                "created_at": "2019-11-16T10:11:12.634234626Z",
                "transport": { "method": "webhook", "callback": CALLBACK_URL },
                "cost": 1
            }],
            "total": 1,
            "total_cost": 1,
            "max_total_cost": 10000
        }),
    )
}

#[tokio::test]
async fn test_register_over_http_skips_failure() {
    let transport = Arc::new(
        MockHttpTransport::new()
            .with_response(created("one", "stream.online"))
            .with_response(MockResponse::error(400, "invalid condition"))
            .with_response(created("three", "stream.offline")),
    );
    let client = EventSubClient::with_transport(config(), transport.clone());

    let registry = SubscriptionRegistry::new();
    registry
        .add(
            "streams",
            ["stream.online", "channel.raid", "stream.offline"]
                .iter()
                .map(|t| {
                    SubscriptionSpec::builder(*t)
                        .condition("broadcaster_user_id", "12826")
                        .build()
                })
                .collect(),
        )
        .unwrap();

    let report = client.register(&registry).await.unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(report.failed.len(), 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.method == Method::POST));
    assert_eq!(requests[1].body.as_ref().unwrap()["type"], "channel.raid");
    assert_eq!(
        requests[0].headers.get("client-id").unwrap(),
        "hof5gwx0su6owfnys0nyan9c87zr6t"
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_retries_rate_limit_only() {
    let transport = Arc::new(
        MockHttpTransport::new()
            .with_response(MockResponse::rate_limited(0))
            .with_response(created("one", "stream.online")),
    );
    let mut config = config();
    config.max_retries = 1;
    let client = EventSubClient::with_transport(config, transport.clone());

    let registry = SubscriptionRegistry::new();
    registry
        .add("streams", vec![SubscriptionSpec::builder("stream.online").build()])
        .unwrap();

    let report = client.register(&registry).await.unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_create_timeout_not_retried() {
    let transport = Arc::new(
        MockHttpTransport::new()
            .with_response(MockResponse::timed_out())
            .with_response(created("one", "stream.online")),
    );
    let mut config = config();
    config.max_retries = 2;
    let client = EventSubClient::with_transport(config, transport.clone());

    let registry = SubscriptionRegistry::new();
    registry
        .add("streams", vec![SubscriptionSpec::builder("stream.online").build()])
        .unwrap();

    let report = client.register(&registry).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.remaining_responses(), 1);
}

#[tokio::test]
async fn test_client_dispatcher_uses_configured_secret() {
    let client = EventSubClient::with_transport(config(), Arc::new(MockHttpTransport::new()));
    let handler = FnHandler::builder()
        .on_event(|_, _| {})
        .on_revocation(|_| {})
        .build()
        .unwrap();
    let dispatcher = client.dispatcher(Arc::new(handler)).unwrap();

    let request = fixtures::signed_request(
        SECRET,
        "webhook_callback_verification",
        None,
        &fixtures::verification_body("pogchamp-kappa-360noscope-vohiyo"),
    );

    assert_eq!(
        dispatcher.handle(&request).await.unwrap(),
        WebhookResponse::Challenge("pogchamp-kappa-360noscope-vohiyo".to_string())
    );
}
