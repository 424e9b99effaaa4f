//! EventSub client implementation.
//!
//! Ties configuration, authentication and transport together and hands out
//! the subscription service and webhook dispatcher built from them.

use crate::auth::AuthManager;
use crate::config::EventSubConfig;
use crate::errors::EventSubResult;
use crate::services::eventsub::{EventSubApi, EventSubService};
use crate::subscriptions::{RegistrationReport, SubscriptionRegistry};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::webhooks::{EventHandler, WebhookDispatcher};
use std::sync::Arc;
use tracing::info;

/// Main EventSub client
pub struct EventSubClient {
    config: Arc<EventSubConfig>,
    auth: AuthManager,
    subscriptions: EventSubService,
}

impl EventSubClient {
    /// Create a new client with the given configuration
    pub fn new(config: EventSubConfig) -> EventSubResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: EventSubConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        let auth = AuthManager::new(config.clone());
        let subscriptions = EventSubService::new(transport, auth.clone(), config.clone());

        Self {
            config,
            auth,
            subscriptions,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EventSubConfig {
        &self.config
    }

    /// Get the authentication manager
    pub fn auth_manager(&self) -> &AuthManager {
        &self.auth
    }

    /// Get the subscriptions service
    pub fn subscriptions(&self) -> &dyn EventSubApi {
        &self.subscriptions
    }

    /// Build a webhook dispatcher using the configured secret
    pub fn dispatcher(&self, handler: Arc<dyn EventHandler>) -> EventSubResult<WebhookDispatcher> {
        WebhookDispatcher::from_config(&self.config, handler)
    }

    /// Register every spec in `registry` with the configured callback and secret
    pub async fn register(&self, registry: &SubscriptionRegistry) -> EventSubResult<RegistrationReport> {
        let report = registry.setup(&self.subscriptions, &self.config).await?;
        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            failed = report.failed.len(),
            "Subscription registration finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for EventSubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
