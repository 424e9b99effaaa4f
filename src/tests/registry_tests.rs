//! Subscription registry tests.

use crate::config::EventSubConfig;
use crate::errors::{ConfigurationError, EventSubError};
use crate::fixtures::{self, CALLBACK_URL, SECRET};
use crate::mocks::MockEventSubApi;
use crate::subscriptions::{
    list_subscriptions, RegistrationMode, SubscriptionComponent, SubscriptionRegistry,
    SubscriptionSpec,
};
use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};

fn secret() -> SecretString {
    SecretString::new(SECRET.to_string())
}

fn three_specs() -> Vec<SubscriptionSpec> {
    vec![
        SubscriptionSpec::builder("stream.online")
            .condition("broadcaster_user_id", "12826")
            .build(),
        SubscriptionSpec::builder("channel.ban")
            .condition("broadcaster_user_id", "12826")
            .build(),
        SubscriptionSpec::builder("channel.follow")
            .version("2")
            .condition("broadcaster_user_id", "12826")
            .condition("moderator_user_id", "12826")
            .build(),
    ]
}

#[tokio::test]
async fn test_failure_does_not_abort_batch() {
    let api = MockEventSubApi::new().fail_type("channel.ban", 403, "subscription missing proper authorization");
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
        .await;

    assert_eq!(api.created_types(), ["stream.online", "channel.ban", "channel.follow"]);
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.created[0].subscription_type, "stream.online");
    assert_eq!(report.created[1].subscription_type, "channel.follow");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].spec.event_type(), "channel.ban");
    assert_eq!(report.failed[0].error.http_status(), Some(403));
    assert!(!report.is_complete());
    assert_eq!(report.attempted(), 3);
}

#[tokio::test]
async fn test_failures_name_their_component() {
    let api = MockEventSubApi::new().fail_type("channel.ban", 403, "subscription missing proper authorization");
    let registry = SubscriptionRegistry::new();
    registry
        .add(
            "streams",
            vec![
                SubscriptionSpec::builder("stream.online")
                    .condition("broadcaster_user_id", "12826")
                    .build(),
                SubscriptionSpec::builder("channel.ban")
                    .condition("broadcaster_user_id", "12826")
                    .build(),
            ],
        )
        .unwrap();
    registry
        .add(
            "moderation",
            vec![SubscriptionSpec::builder("channel.ban")
                .condition("broadcaster_user_id", "12826")
                .build()],
        )
        .unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
        .await;

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].component, "streams");
    assert_eq!(report.failed[1].component, "moderation");
    assert!(report
        .failed
        .iter()
        .all(|f| f.spec.event_type() == "channel.ban"));
}

#[tokio::test]
async fn test_timeout_is_a_single_failure() {
    let api = MockEventSubApi::new().timeout_type("stream.online");
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
        .await;

    assert_eq!(api.create_calls(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.created.len(), 2);
}

#[tokio::test]
async fn test_create_request_carries_webhook_transport() {
    let api = MockEventSubApi::new();
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
        .await;

    let created = api.created();
    let follow = &created[2];
    assert_eq!(follow.subscription_type, "channel.follow");
    assert_eq!(follow.version, "2");
    assert_eq!(follow.condition["moderator_user_id"], "12826");
    assert_eq!(follow.transport.method, "webhook");
    assert_eq!(follow.transport.callback, CALLBACK_URL);
    assert_eq!(follow.transport.secret.expose_secret(), SECRET);
}

#[tokio::test]
async fn test_always_create_repeats_on_second_pass() {
    let api = MockEventSubApi::new();
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    for _ in 0..2 {
        registry
            .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
            .await;
    }

    assert_eq!(api.create_calls(), 6);
    assert!(api.list_requests().is_empty());
}

#[tokio::test]
async fn test_conflict_counts_as_existing() {
    let api = MockEventSubApi::new().fail_type("stream.online", 409, "subscription already exists");
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::AlwaysCreate)
        .await;

    assert!(report.is_complete());
    assert_eq!(report.existing.len(), 1);
    assert_eq!(report.existing[0].spec.event_type(), "stream.online");
    assert_eq!(report.existing[0].component, "bot");
    assert_eq!(report.created.len(), 2);
}

#[tokio::test]
async fn test_skip_existing_pages_and_skips_matches() {
    let api = MockEventSubApi::new()
        .with_list_page(
            vec![fixtures::subscription_record(
                "a",
                "stream.online",
                &[("broadcaster_user_id", "12826")],
            )],
            Some("page-2"),
        )
        .with_list_page(
            vec![fixtures::subscription_record(
                "b",
                "channel.ban",
                &[("broadcaster_user_id", "99999")],
            )],
            None,
        );
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::SkipExisting)
        .await;

    let lists = api.list_requests();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].after.as_deref(), Some("page-2"));

    assert_eq!(api.created_types(), ["channel.ban", "channel.follow"]);
    assert_eq!(report.existing.len(), 1);
    assert_eq!(report.existing[0].spec.event_type(), "stream.online");
}

#[tokio::test]
async fn test_skip_existing_ignores_disabled_records() {
    let mut revoked = fixtures::subscription_record("a", "stream.online", &[("broadcaster_user_id", "12826")]);
    revoked.status = "authorization_revoked".to_string();
    let api = MockEventSubApi::new().with_list_page(vec![revoked], None);
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::SkipExisting)
        .await;

    assert_eq!(api.create_calls(), 3);
}

#[tokio::test]
async fn test_skip_existing_falls_back_when_listing_fails() {
    let api = MockEventSubApi::new().fail_list(401, "Invalid OAuth token");
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::SkipExisting)
        .await;

    assert_eq!(api.create_calls(), 3);
    assert_eq!(report.created.len(), 3);
}

#[tokio::test]
async fn test_setup_requires_secret_and_callback() {
    let api = MockEventSubApi::new();
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let no_secret = EventSubConfig::builder()
        .callback_url(CALLBACK_URL)
        .unwrap()
        .build_unchecked();
    let err = registry.setup(&api, &no_secret).await.unwrap_err();
    assert!(matches!(
        err,
        EventSubError::Configuration(ConfigurationError::MissingSecret)
    ));

    let no_callback = EventSubConfig::builder().secret(SECRET).build_unchecked();
    let err = registry.setup(&api, &no_callback).await.unwrap_err();
    assert!(matches!(
        err,
        EventSubError::Configuration(ConfigurationError::MissingCallbackUrl)
    ));

    assert_eq!(api.create_calls(), 0);
}

#[tokio::test]
async fn test_setup_uses_configured_mode() {
    let api = MockEventSubApi::new();
    let registry = SubscriptionRegistry::new();
    registry.add("bot", three_specs()).unwrap();

    let config = EventSubConfig::builder()
        .secret(SECRET)
        .callback_url(CALLBACK_URL)
        .unwrap()
        .registration_mode(RegistrationMode::SkipExisting)
        .build_unchecked();
    let report = registry.setup(&api, &config).await.unwrap();

    assert_eq!(api.list_requests().len(), 1);
    assert_eq!(report.created.len(), 3);
    assert_eq!(api.created()[0].transport.callback, CALLBACK_URL);
}

#[tokio::test]
async fn test_list_subscriptions_passes_filters() {
    let api = MockEventSubApi::new().with_list_page(
        vec![fixtures::subscription_record("a", "stream.online", &[])],
        None,
    );

    let records = list_subscriptions(&api, Some("enabled"), Some("stream.online"))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let request = &api.list_requests()[0];
    assert_eq!(request.status.as_deref(), Some("enabled"));
    assert_eq!(request.subscription_type.as_deref(), Some("stream.online"));
    assert!(request.after.is_none());
}

#[tokio::test]
async fn test_list_subscriptions_stops_on_cursor_cycle() {
    let api = MockEventSubApi::new()
        .with_list_page(vec![fixtures::subscription_record("a", "stream.online", &[])], Some("A"))
        .with_list_page(vec![fixtures::subscription_record("b", "channel.ban", &[])], Some("B"))
        .with_list_page(vec![fixtures::subscription_record("c", "channel.follow", &[])], Some("A"))
        .with_list_page(vec![fixtures::subscription_record("d", "stream.offline", &[])], None);

    let records = list_subscriptions(&api, None, None).await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    let afters: Vec<_> = api.list_requests().into_iter().map(|r| r.after).collect();
    assert_eq!(afters, [None, Some("A".to_string()), Some("B".to_string())]);
}

#[tokio::test]
async fn test_delete_subscription_passes_through() {
    let api = MockEventSubApi::new();
    crate::subscriptions::delete_subscription(&api, "f1c2a387").await.unwrap();
    assert_eq!(api.deleted(), ["f1c2a387"]);
}

struct Moderation {
    broadcaster: String,
}

impl SubscriptionComponent for Moderation {
    fn component_name(&self) -> &str {
        "moderation"
    }

    fn declare_subscriptions(&self) -> Vec<SubscriptionSpec> {
        let broadcaster = self.broadcaster.clone();
        vec![SubscriptionSpec::builder("channel.ban")
            .condition_with("broadcaster_user_id", move || broadcaster)
            .build()]
    }
}

#[tokio::test]
async fn test_component_declarations_registered() {
    let api = MockEventSubApi::new();
    let registry = SubscriptionRegistry::new();
    registry
        .register_component(&Moderation {
            broadcaster: "12826".to_string(),
        })
        .unwrap();

    let report = registry
        .register_all(&api, CALLBACK_URL, &secret(), RegistrationMode::default())
        .await;

    assert_eq!(report.created.len(), 1);
    assert_eq!(api.created()[0].condition["broadcaster_user_id"], "12826");
}

#[test]
fn test_concurrent_adds_are_all_kept() {
    let registry = std::sync::Arc::new(SubscriptionRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry
                    .add(
                        format!("component-{}", i),
                        vec![SubscriptionSpec::builder("stream.online").build()],
                    )
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 8);
    assert_eq!(registry.specs().len(), 8);
}
