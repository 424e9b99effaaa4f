//! Classification and dispatch of authenticated webhook messages.

use super::{EventHandler, SignatureVerifier, WebhookRequest, WebhookResponse};
use crate::config::EventSubConfig;
use crate::errors::{EventSubResult, WebhookError};
use crate::events::EventEnvelope;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Message classification carried in the message-type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// Endpoint ownership handshake
    Verification,
    /// Event delivery
    Notification,
    /// Subscription revoked by the remote side
    Revocation,
    /// Any other value; accepted and ignored
    Unrecognized(String),
    /// Header absent
    Missing,
}

impl MessageType {
    /// Classify a header value, ignoring case
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Missing;
        };

        match value.to_ascii_lowercase().as_str() {
            "webhook_callback_verification" => Self::Verification,
            "notification" => Self::Notification,
            "revocation" => Self::Revocation,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Label used in logs
    pub fn as_str(&self) -> &str {
        match self {
            Self::Verification => "webhook_callback_verification",
            Self::Notification => "notification",
            Self::Revocation => "revocation",
            Self::Unrecognized(other) => other,
            Self::Missing => "missing",
        }
    }
}

#[derive(Deserialize)]
struct ChallengeBody {
    challenge: String,
}

/// Verifies, classifies and routes inbound webhook messages
///
/// Holds no mutable state, so one dispatcher can serve concurrent
/// requests behind an `Arc`.
pub struct WebhookDispatcher {
    verifier: SignatureVerifier,
    handler: Arc<dyn EventHandler>,
}

impl WebhookDispatcher {
    /// Create a dispatcher from a verifier and a handler
    pub fn new(verifier: SignatureVerifier, handler: Arc<dyn EventHandler>) -> Self {
        Self { verifier, handler }
    }

    /// Create a dispatcher from configuration
    ///
    /// Fails when no secret is configured.
    pub fn from_config(config: &EventSubConfig, handler: Arc<dyn EventHandler>) -> EventSubResult<Self> {
        let mut verifier = SignatureVerifier::new(config.require_secret()?.clone());
        if let Some(age) = config.max_message_age {
            verifier = verifier.with_max_message_age(age);
        }
        Ok(Self::new(verifier, handler))
    }

    /// Handle one inbound request
    ///
    /// Signature failures produce [`WebhookResponse::Forbidden`] without
    /// looking at the body. A body that is not the expected JSON is
    /// returned as an error for the transport layer to turn into a 4xx.
    #[instrument(skip(self, request), fields(message_id = request.message_id().unwrap_or_default()))]
    pub async fn handle(&self, request: &WebhookRequest) -> EventSubResult<WebhookResponse> {
        if let Err(error) = self.verifier.verify_request(request) {
            warn!(error = %error, "Rejecting unauthenticated webhook");
            return Ok(WebhookResponse::Forbidden);
        }

        let message_type = MessageType::from_header(request.message_type());

        match message_type {
            MessageType::Verification => self.handle_verification(request),
            MessageType::Notification => self.handle_notification(request).await,
            MessageType::Revocation => self.handle_revocation(request).await,
            MessageType::Unrecognized(_) | MessageType::Missing => {
                debug!(message_type = message_type.as_str(), "Ignoring unrecognized message type");
                Ok(WebhookResponse::NoContent)
            }
        }
    }

    fn handle_verification(&self, request: &WebhookRequest) -> EventSubResult<WebhookResponse> {
        let body: ChallengeBody =
            serde_json::from_slice(request.body()).map_err(WebhookError::from)?;

        info!(
            subscription_type = request.subscription_type().unwrap_or_default(),
            "Answering callback verification challenge"
        );
        Ok(WebhookResponse::Challenge(body.challenge))
    }

    async fn handle_notification(&self, request: &WebhookRequest) -> EventSubResult<WebhookResponse> {
        let event_type = request.subscription_type();
        let envelope = EventEnvelope::from_slice(request.body())?.with_fallback_type(event_type);
        let event_type = event_type.unwrap_or(envelope.event_type()).to_string();

        debug!(event_type = %event_type, "Dispatching notification");
        self.handler.process_event(&event_type, envelope).await;

        Ok(WebhookResponse::NoContent)
    }

    async fn handle_revocation(&self, request: &WebhookRequest) -> EventSubResult<WebhookResponse> {
        let envelope = EventEnvelope::from_slice(request.body())?;

        warn!(
            subscription_type = envelope.event_type(),
            subscription_id = envelope.subscription_id().unwrap_or_default(),
            status = envelope.status(),
            "Subscription revoked"
        );
        self.handler.process_revocation(envelope).await;

        Ok(WebhookResponse::NoContent)
    }
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
