//! Error types for the EventSub integration.
//!
//! Provides an error hierarchy covering inbound webhook handling,
//! configuration mistakes and Helix API failures, with retry support.

use std::time::Duration;
use thiserror::Error;

/// Result type for EventSub operations
pub type EventSubResult<T> = Result<T, EventSubError>;

/// Root error type for the EventSub integration
#[derive(Error, Debug)]
pub enum EventSubError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Inbound webhook error
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Authentication error (outbound API)
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Request rejected by the API
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Rate limit error
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Server error
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Response parsing error
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Generic API error
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
}

impl EventSubError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "EVENTSUB_CONFIG",
            Self::Webhook(_) => "EVENTSUB_WEBHOOK",
            Self::Authentication(_) => "EVENTSUB_AUTH",
            Self::Request(_) => "EVENTSUB_REQUEST",
            Self::RateLimit(_) => "EVENTSUB_RATE_LIMIT",
            Self::Network(_) => "EVENTSUB_NETWORK",
            Self::Server(_) => "EVENTSUB_SERVER",
            Self::Response(_) => "EVENTSUB_RESPONSE",
            Self::Api { .. } => "EVENTSUB_API",
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(NetworkError::Timeout)
                | Self::Network(NetworkError::ConnectionFailed { .. })
                | Self::RateLimit(RateLimitError::RateLimited { .. })
                | Self::Server(ServerError::ServiceUnavailable)
                | Self::Server(ServerError::InternalError)
                | Self::Server(ServerError::BadGateway)
        )
    }

    /// Get retry-after duration if applicable
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit(RateLimitError::RateLimited { retry_after }) => Some(*retry_after),
            _ => None,
        }
    }

    /// Get the HTTP status code this error corresponds to
    ///
    /// For webhook errors this is the status the receiving endpoint should
    /// answer with; for API errors it is the status the remote side sent.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Webhook(WebhookError::InvalidSignature)
            | Self::Webhook(WebhookError::MissingHeader { .. })
            | Self::Webhook(WebhookError::ExpiredMessage { .. }) => Some(403),
            Self::Webhook(WebhookError::InvalidPayload { .. }) => Some(400),
            Self::Authentication(AuthenticationError::Unauthorized { .. }) => Some(401),
            Self::Authentication(AuthenticationError::Forbidden { .. }) => Some(403),
            Self::Request(RequestError::BadRequest { .. }) => Some(400),
            Self::Request(RequestError::NotFound { .. }) => Some(404),
            Self::Request(RequestError::Conflict { .. }) => Some(409),
            Self::RateLimit(_) => Some(429),
            Self::Server(ServerError::InternalError) => Some(500),
            Self::Server(ServerError::BadGateway) => Some(502),
            Self::Server(ServerError::ServiceUnavailable) => Some(503),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote side reported the subscription as already existing
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Request(RequestError::Conflict { .. }))
    }

    /// Map an error response from the Helix API to a semantic error
    pub fn from_api_error(status: u16, message: Option<&str>) -> Self {
        let message = message.unwrap_or("Unknown error").to_string();

        match status {
            400 => Self::Request(RequestError::BadRequest { message }),
            401 => Self::Authentication(AuthenticationError::Unauthorized { message }),
            403 => Self::Authentication(AuthenticationError::Forbidden { message }),
            404 => Self::Request(RequestError::NotFound { message }),
            409 => Self::Request(RequestError::Conflict { message }),
            429 => Self::RateLimit(RateLimitError::RateLimited {
                retry_after: Duration::from_secs(crate::DEFAULT_RATE_LIMIT_RETRY_SECS),
            }),
            500 => Self::Server(ServerError::InternalError),
            502 => Self::Server(ServerError::BadGateway),
            503 => Self::Server(ServerError::ServiceUnavailable),
            _ => Self::Api { status, message },
        }
    }
}

/// Configuration errors
///
/// These are programming errors and surface at startup, not per request.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Webhook secret was never configured
    #[error("Webhook secret is missing")]
    MissingSecret,

    /// Webhook secret violates the length rules of the remote service
    #[error("Webhook secret must be 10 to 100 ASCII characters, got {length}")]
    InvalidSecret {
        /// Length of the rejected secret
        length: usize,
    },

    /// Callback URL was never configured
    #[error("Webhook callback URL is missing")]
    MissingCallbackUrl,

    /// Client ID missing for outbound calls
    #[error("Client ID is missing")]
    MissingClientId,

    /// Access token missing for outbound calls
    #[error("Access token is missing")]
    MissingAccessToken,

    /// A required event handler was not supplied
    #[error("Required handler is missing: {name}")]
    MissingHandler {
        /// Name of the missing capability
        name: &'static str,
    },

    /// A component registered its subscriptions twice
    #[error("Component already registered: {component}")]
    DuplicateComponent {
        /// Component identity
        component: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Inbound webhook errors
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Signature did not match, or was absent
    #[error("Invalid signature")]
    InvalidSignature,

    /// A header required to compute the signature is absent
    #[error("Missing header: {name}")]
    MissingHeader {
        /// Header name
        name: &'static str,
    },

    /// Message is outside the accepted replay window
    #[error("Message timestamp outside the accepted window: {timestamp}")]
    ExpiredMessage {
        /// Raw timestamp header value
        timestamp: String,
    },

    /// Body could not be parsed as the expected JSON
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload {
            message: err.to_string(),
        }
    }
}

/// Authentication errors for outbound API calls
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// Token missing, invalid or expired
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message
        message: String,
    },

    /// Token lacks the scopes for this subscription type
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message
        message: String,
    },

    /// Header value could not be built from the token
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Request errors reported by the API
#[derive(Error, Debug)]
pub enum RequestError {
    /// Malformed request
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message
        message: String,
    },

    /// Subscription not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message
        message: String,
    },

    /// Subscription already exists
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message
        message: String,
    },
}

/// Rate limit errors
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// Rate limited with retry information
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Duration to wait before retrying
        retry_after: Duration,
    },
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            NetworkError::Http(err.to_string())
        }
    }
}

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Internal server error
    #[error("Internal server error")]
    InternalError,

    /// Bad gateway
    #[error("Bad gateway")]
    BadGateway,

    /// Service unavailable
    #[error("Service unavailable")]
    ServiceUnavailable,
}

/// Response parsing errors
#[derive(Error, Debug)]
pub enum ResponseError {
    /// JSON deserialization error
    #[error("Deserialization error: {message}")]
    DeserializationError {
        /// Error message
        message: String,
    },

    /// Unexpected response format
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::DeserializationError {
            message: err.to_string(),
        }
    }
}
