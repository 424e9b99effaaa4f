//! Configuration management for EventSub webhooks.
//!
//! Supports configuration via:
//! - Explicit values
//! - Environment variables
//! - Builder pattern

use crate::errors::{ConfigurationError, EventSubError, EventSubResult};
use crate::observability::{redact_secret, redact_url, Redacted};
use crate::subscriptions::RegistrationMode;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Minimum secret length accepted by the remote service
pub const MIN_SECRET_LEN: usize = 10;

/// Maximum secret length accepted by the remote service
pub const MAX_SECRET_LEN: usize = 100;

/// Configuration shared by the dispatcher, registry and API client
#[derive(Clone)]
pub struct EventSubConfig {
    /// Shared secret used to sign webhook messages
    pub(crate) secret: Option<SecretString>,
    /// Public URL the remote service delivers to
    pub(crate) callback_url: Option<Url>,
    /// Application client ID for outbound calls
    pub(crate) client_id: Option<String>,
    /// Pre-acquired app access token for outbound calls
    pub(crate) access_token: Option<SecretString>,
    /// Base URL for API requests
    pub base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retries per outbound call
    pub max_retries: u32,
    /// Replay window for inbound messages; disabled when `None`
    pub max_message_age: Option<Duration>,
    /// How reconciliation treats subscriptions that already exist
    pub registration_mode: RegistrationMode,
}

impl std::fmt::Debug for EventSubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubConfig")
            .field("secret", &self.secret.as_ref().map(|s| redact_secret(s.expose_secret())))
            .field("callback_url", &self.callback_url.as_ref().map(|u| redact_url(u.as_str())))
            .field("client_id", &self.client_id)
            .field("access_token", &self.access_token.as_ref().map(Redacted::new))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("max_message_age", &self.max_message_age)
            .field("registration_mode", &self.registration_mode)
            .finish()
    }
}

impl Default for EventSubConfig {
    fn default() -> Self {
        Self {
            secret: None,
            callback_url: None,
            client_id: None,
            access_token: None,
            base_url: Url::parse(crate::DEFAULT_BASE_URL).unwrap(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            max_message_age: None,
            registration_mode: RegistrationMode::default(),
        }
    }
}

impl EventSubConfig {
    /// Create a new configuration builder
    pub fn builder() -> EventSubConfigBuilder {
        EventSubConfigBuilder::new()
    }

    /// Create configuration from environment variables
    pub fn from_env() -> EventSubResult<Self> {
        let mut builder = EventSubConfigBuilder::new();

        if let Ok(secret) = std::env::var("TWITCH_EVENTSUB_SECRET") {
            builder = builder.secret(&secret);
        }

        if let Ok(url) = std::env::var("TWITCH_EVENTSUB_CALLBACK_URL") {
            builder = builder.callback_url(&url)?;
        }

        if let Ok(id) = std::env::var("TWITCH_CLIENT_ID") {
            builder = builder.client_id(&id);
        }

        if let Ok(token) = std::env::var("TWITCH_ACCESS_TOKEN") {
            builder = builder.access_token(&token);
        }

        if let Ok(url) = std::env::var("TWITCH_API_BASE_URL") {
            builder = builder.base_url(&url)?;
        }

        if let Ok(timeout) = std::env::var("TWITCH_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(secs));
            }
        }

        if let Ok(retries) = std::env::var("TWITCH_MAX_RETRIES") {
            if let Ok(n) = retries.parse::<u32>() {
                builder = builder.max_retries(n);
            }
        }

        if let Ok(age) = std::env::var("TWITCH_EVENTSUB_MAX_MESSAGE_AGE") {
            if let Ok(secs) = age.parse::<u64>() {
                builder = builder.max_message_age(Duration::from_secs(secs));
            }
        }

        builder.build()
    }

    /// Get the webhook secret, failing if it was never configured
    pub fn require_secret(&self) -> EventSubResult<&SecretString> {
        self.secret
            .as_ref()
            .ok_or(EventSubError::Configuration(ConfigurationError::MissingSecret))
    }

    /// Get the callback URL, failing if it was never configured
    pub fn require_callback_url(&self) -> EventSubResult<&Url> {
        self.callback_url
            .as_ref()
            .ok_or(EventSubError::Configuration(ConfigurationError::MissingCallbackUrl))
    }

    /// Get the webhook secret if available
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }

    /// Get the callback URL if available
    pub fn callback_url(&self) -> Option<&Url> {
        self.callback_url.as_ref()
    }

    /// Get the client ID if available
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get the access token if available
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    /// Build the full URL for an endpoint
    pub fn build_url(&self, endpoint: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> EventSubResult<()> {
        if let Some(secret) = &self.secret {
            validate_secret(secret.expose_secret())?;
        }

        if let Some(url) = &self.callback_url {
            if url.scheme() != "https" {
                return Err(ConfigurationError::InvalidConfiguration {
                    message: format!("Callback URL must use https, got {}", url.scheme()),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn validate_secret(secret: &str) -> Result<(), ConfigurationError> {
    let length = secret.len();
    if !secret.is_ascii() || !(MIN_SECRET_LEN..=MAX_SECRET_LEN).contains(&length) {
        return Err(ConfigurationError::InvalidSecret { length });
    }
    Ok(())
}

/// Builder for EventSubConfig
#[derive(Default)]
pub struct EventSubConfigBuilder {
    config: EventSubConfig,
}

impl EventSubConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EventSubConfig::default(),
        }
    }

    /// Set the webhook secret
    pub fn secret(mut self, secret: &str) -> Self {
        self.config.secret = Some(SecretString::new(secret.to_string()));
        self
    }

    /// Set the callback URL
    pub fn callback_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.config.callback_url =
            Some(Url::parse(url).map_err(|e| ConfigurationError::InvalidConfiguration {
                message: format!("Invalid callback URL: {}", e),
            })?);
        Ok(self)
    }

    /// Set the client ID
    pub fn client_id(mut self, id: &str) -> Self {
        self.config.client_id = Some(id.to_string());
        self
    }

    /// Set the app access token
    pub fn access_token(mut self, token: &str) -> Self {
        self.config.access_token = Some(SecretString::new(token.to_string()));
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        self.config.base_url =
            Url::parse(url).map_err(|e| ConfigurationError::InvalidConfiguration {
                message: format!("Invalid URL: {}", e),
            })?;
        Ok(self)
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Reject inbound messages older than `age`
    pub fn max_message_age(mut self, age: Duration) -> Self {
        self.config.max_message_age = Some(age);
        self
    }

    /// Set the registration mode
    pub fn registration_mode(mut self, mode: RegistrationMode) -> Self {
        self.config.registration_mode = mode;
        self
    }

    /// Build the configuration
    pub fn build(self) -> EventSubResult<EventSubConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation (for testing)
    pub fn build_unchecked(self) -> EventSubConfig {
        self.config
    }
}
