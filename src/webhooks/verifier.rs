//! HMAC-SHA256 signature verification for inbound messages.

use super::WebhookRequest;
use super::{HEADER_MESSAGE_ID, HEADER_MESSAGE_TIMESTAMP};
use crate::errors::WebhookError;
use crate::observability::{redact_signature, Redacted};
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value
pub const HMAC_PREFIX: &str = "sha256=";

/// Compute `sha256=<hex>` over `message_id ++ message_timestamp ++ body`
pub fn compute_signature(
    secret: &[u8],
    message_id: &str,
    message_timestamp: &str,
    body: &[u8],
) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message_id.as_bytes());
    mac.update(message_timestamp.as_bytes());
    mac.update(body);

    format!("{}{}", HMAC_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Check a provided signature in constant time
///
/// An absent signature never verifies.
pub fn verify(
    secret: &[u8],
    message_id: &str,
    message_timestamp: &str,
    body: &[u8],
    provided_signature: Option<&str>,
) -> bool {
    let Some(provided) = provided_signature else {
        return false;
    };

    let expected = compute_signature(secret, message_id, message_timestamp, body);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

/// Webhook signature verifier
pub struct SignatureVerifier {
    secret: SecretString,
    max_message_age: Option<Duration>,
}

impl SignatureVerifier {
    /// Create a new verifier with the shared secret
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            max_message_age: None,
        }
    }

    /// Also reject messages sent longer ago than `age`
    pub fn with_max_message_age(mut self, age: Duration) -> Self {
        self.max_message_age = Some(age);
        self
    }

    /// Verify the signature fields directly
    pub fn verify(
        &self,
        message_id: &str,
        message_timestamp: &str,
        body: &[u8],
        provided_signature: Option<&str>,
    ) -> bool {
        verify(
            self.secret.expose_secret().as_bytes(),
            message_id,
            message_timestamp,
            body,
            provided_signature,
        )
    }

    /// Verify an inbound request
    pub fn verify_request(&self, request: &WebhookRequest) -> Result<(), WebhookError> {
        let message_id = request.message_id().ok_or(WebhookError::MissingHeader {
            name: HEADER_MESSAGE_ID,
        })?;
        let timestamp = request
            .message_timestamp()
            .ok_or(WebhookError::MissingHeader {
                name: HEADER_MESSAGE_TIMESTAMP,
            })?;

        if !self.verify(
            message_id,
            timestamp,
            request.body(),
            request.message_signature(),
        ) {
            warn!(
                message_id,
                signature = %redact_signature(request.message_signature().unwrap_or_default()),
                "Signature verification failed"
            );
            return Err(WebhookError::InvalidSignature);
        }

        if let Some(max_age) = self.max_message_age {
            self.verify_freshness(timestamp, max_age)?;
        }

        debug!(message_id, "Webhook signature verified");
        Ok(())
    }

    fn verify_freshness(&self, timestamp: &str, max_age: Duration) -> Result<(), WebhookError> {
        let expired = || WebhookError::ExpiredMessage {
            timestamp: timestamp.to_string(),
        };

        let sent_at = DateTime::parse_from_rfc3339(timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| expired())?;
        let age = Utc::now().signed_duration_since(sent_at);
        let max_age = chrono::Duration::from_std(max_age).map_err(|_| expired())?;

        if age > max_age {
            warn!(
                timestamp,
                age_secs = age.num_seconds(),
                max_age_secs = max_age.num_seconds(),
                "Message outside replay window"
            );
            return Err(expired());
        }

        Ok(())
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &Redacted::new(&self.secret))
            .field("max_message_age", &self.max_message_age)
            .finish()
    }
}
