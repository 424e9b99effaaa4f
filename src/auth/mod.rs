//! Authorization headers for outbound Helix API requests.
//!
//! The access token is expected to be acquired elsewhere and handed to
//! the configuration; this module only turns it into request headers.

use crate::config::EventSubConfig;
use crate::errors::{AuthenticationError, ConfigurationError, EventSubError, EventSubResult};
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Header carrying the application client ID
pub const CLIENT_ID_HEADER: &str = "client-id";

/// Builds authenticated headers for API requests
#[derive(Clone)]
pub struct AuthManager {
    config: Arc<EventSubConfig>,
}

impl AuthManager {
    /// Create a new authentication manager
    pub fn new(config: Arc<EventSubConfig>) -> Self {
        Self { config }
    }

    /// Get headers for an API request
    pub fn get_headers(&self) -> EventSubResult<HeaderMap> {
        let client_id = self
            .config
            .client_id()
            .ok_or(EventSubError::Configuration(ConfigurationError::MissingClientId))?;
        let token = self
            .config
            .access_token()
            .ok_or(EventSubError::Configuration(ConfigurationError::MissingAccessToken))?;

        let mut headers = HeaderMap::new();

        headers.insert(
            HeaderName::from_static(CLIENT_ID_HEADER),
            HeaderValue::from_str(client_id)
                .map_err(|_| EventSubError::Authentication(AuthenticationError::InvalidCredentials))?,
        );

        let auth_value = format!("Bearer {}", token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|_| EventSubError::Authentication(AuthenticationError::InvalidCredentials))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    /// Check that both credentials are present
    pub fn has_credentials(&self) -> bool {
        self.config.client_id().is_some() && self.config.access_token().is_some()
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("client_id", &self.config.client_id())
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
