//! Bounded retries for Helix API calls.
//!
//! Each call is tagged with an operation label so retry logs can be tied
//! back to the endpoint. Which failures are retried is decided by a
//! [`RetryPolicy`]; creation uses a stricter policy than reads and deletes.

use crate::config::EventSubConfig;
use crate::errors::{EventSubError, EventSubResult, RateLimitError, ServerError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff settings for one API client
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay, including server-requested ones
    pub max_delay: Duration,
    /// Growth factor between retries
    pub multiplier: f64,
    /// Spread delays over 50%..150% of the computed value
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create the default retry configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive retry settings from client configuration
    ///
    /// The retry budget follows `max_retries`; no single wait may exceed
    /// the request timeout.
    pub fn from_config(config: &EventSubConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: config.max_retries,
            max_delay: defaults.max_delay.min(config.timeout),
            ..defaults
        }
    }

    /// Set the retry budget
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the first delay
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor
    pub fn multiplier(mut self, m: f64) -> Self {
        self.multiplier = m;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Backoff before retry number `retry` (1-based), capped at `max_delay`
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let cap_ms = self.max_delay.as_millis() as f64;
        let millis = (self.initial_delay.as_millis() as f64 * factor).min(cap_ms);
        let mut delay = Duration::from_millis(millis as u64);

        if self.with_jitter {
            delay = delay.mul_f64(0.5 + jitter_fraction());
        }
        delay.min(self.max_delay)
    }
}

/// Fraction in [0.0, 1.0) drawn from a v4 UUID
fn jitter_fraction() -> f64 {
    (uuid::Uuid::new_v4().as_u128() % 1000) as f64 / 1000.0
}

/// Decides which failures of an operation are worth another attempt
pub trait RetryPolicy: Send + Sync {
    /// Whether `error` may be retried
    fn is_retryable(&self, error: &EventSubError) -> bool;

    /// Delay requested by the server, overriding backoff
    fn retry_delay(&self, error: &EventSubError) -> Option<Duration> {
        error.retry_after()
    }
}

/// Policy for reads and deletes: anything transient is retried
#[derive(Debug, Clone, Default)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn is_retryable(&self, error: &EventSubError) -> bool {
        error.is_retryable()
    }
}

/// Policy for subscription creation
///
/// Only retries responses that prove nothing was created; a timeout may
/// have reached the server and retrying it could register a duplicate.
#[derive(Debug, Clone, Default)]
pub struct CreateRetryPolicy;

impl RetryPolicy for CreateRetryPolicy {
    fn is_retryable(&self, error: &EventSubError) -> bool {
        matches!(
            error,
            EventSubError::RateLimit(RateLimitError::RateLimited { .. })
                | EventSubError::Server(ServerError::ServiceUnavailable)
        )
    }
}

/// Run `operation`, retrying failures `policy` accepts within the budget
pub async fn with_retry<F, Fut, T>(
    operation_name: &'static str,
    config: &RetryConfig,
    policy: &dyn RetryPolicy,
    operation: F,
) -> EventSubResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = EventSubResult<T>>,
{
    let mut retries = 0;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if retries > 0 {
                    debug!(operation = operation_name, retries, "Succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        let retryable = policy.is_retryable(&error);
        if !retryable || retries >= config.max_retries {
            warn!(
                operation = operation_name,
                retries,
                retryable,
                error_code = error.error_code(),
                error = %error,
                "Giving up"
            );
            return Err(error);
        }

        retries += 1;
        let delay = policy
            .retry_delay(&error)
            .unwrap_or_else(|| config.delay_for_attempt(retries))
            .min(config.max_delay);

        debug!(
            operation = operation_name,
            retry = retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
