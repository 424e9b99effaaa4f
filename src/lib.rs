//! Twitch EventSub Webhooks
//!
//! Server-side plumbing for EventSub webhook subscriptions:
//! - HMAC-SHA256 verification of inbound deliveries
//! - Classification into verification, notification and revocation messages
//! - Dispatch to consumer-supplied handlers
//! - Startup registration of declared subscriptions with the Helix API
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use twitch_eventsub::subscriptions::{SubscriptionRegistry, SubscriptionSpec};
//! use twitch_eventsub::webhooks::{FnHandler, WebhookRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = twitch_eventsub::create_client_from_env()?;
//!
//!     let registry = SubscriptionRegistry::new();
//!     registry.add(
//!         "alerts",
//!         vec![SubscriptionSpec::builder("channel.follow")
//!             .version("2")
//!             .condition("broadcaster_user_id", "12826")
//!             .condition("moderator_user_id", "12826")
//!             .build()],
//!     )?;
//!     client.register(&registry).await?;
//!
//!     let handler = FnHandler::builder()
//!         .on_event(|event_type, envelope| println!("{}: {:?}", event_type, envelope.event()))
//!         .on_revocation(|envelope| eprintln!("revoked: {}", envelope.event_type()))
//!         .build()?;
//!     let dispatcher = client.dispatcher(Arc::new(handler))?;
//!
//!     // inside your HTTP server's route:
//!     # let request = http::Request::new(bytes::Bytes::new());
//!     let response = dispatcher.handle(&WebhookRequest::from_http(request)).await?;
//!     let _ = response.into_http();
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `rustls` - TLS via rustls (default)
//! - `native-tls` - TLS via the platform library

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;
pub mod types;

// Services
pub mod services;

// Inbound events and outbound registration
pub mod events;
pub mod subscriptions;
pub mod webhooks;

// Resilience
pub mod resilience;

// Observability
pub mod observability;

// Testing
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use client::EventSubClient;
pub use config::{EventSubConfig, EventSubConfigBuilder};
pub use errors::{EventSubError, EventSubResult};
pub use events::EventEnvelope;
pub use subscriptions::{RegistrationMode, SubscriptionRegistry, SubscriptionSpec};
pub use webhooks::{EventHandler, SignatureVerifier, WebhookDispatcher, WebhookRequest, WebhookResponse};

/// Default base URL for the Helix API
pub const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Default timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum retries
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fallback wait when a 429 carries no usable reset header
pub const DEFAULT_RATE_LIMIT_RETRY_SECS: u64 = 60;

/// Create an EventSub client with the given configuration
pub fn create_client(config: EventSubConfig) -> EventSubResult<EventSubClient> {
    EventSubClient::new(config)
}

/// Create an EventSub client from environment variables
///
/// Reads:
/// - `TWITCH_EVENTSUB_SECRET` - Shared webhook secret (10-100 ASCII chars)
/// - `TWITCH_EVENTSUB_CALLBACK_URL` - Public https callback URL
/// - `TWITCH_CLIENT_ID` - Application client ID
/// - `TWITCH_ACCESS_TOKEN` - App access token
/// - `TWITCH_API_BASE_URL` - Helix base URL override
/// - `TWITCH_TIMEOUT` - Request timeout in seconds
/// - `TWITCH_MAX_RETRIES` - Retry budget per API call
/// - `TWITCH_EVENTSUB_MAX_MESSAGE_AGE` - Replay window in seconds
pub fn create_client_from_env() -> EventSubResult<EventSubClient> {
    let config = EventSubConfig::from_env()?;
    create_client(config)
}
