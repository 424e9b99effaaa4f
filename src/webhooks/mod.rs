//! Inbound EventSub webhook handling.
//!
//! Every request passes through [`SignatureVerifier`] before
//! [`WebhookDispatcher`] classifies it and hands it to an [`EventHandler`].
//! Routing and the HTTP server itself belong to the embedding application;
//! [`WebhookRequest`] and [`WebhookResponse`] convert to and from the
//! `http` crate types.

mod dispatcher;
mod handler;
mod verifier;

pub use dispatcher::*;
pub use handler::*;
pub use verifier::*;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;

/// Header carrying the unique message ID
pub const HEADER_MESSAGE_ID: &str = "twitch-eventsub-message-id";
/// Header carrying the RFC 3339 send time
pub const HEADER_MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
/// Header carrying `sha256=<hex>`
pub const HEADER_MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";
/// Header carrying the message classification
pub const HEADER_MESSAGE_TYPE: &str = "twitch-eventsub-message-type";
/// Header carrying the subscription event type
pub const HEADER_SUBSCRIPTION_TYPE: &str = "twitch-eventsub-subscription-type";

/// An inbound webhook request: headers and the untouched body
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    headers: HeaderMap,
    body: Bytes,
}

impl WebhookRequest {
    /// Create a request from headers and the raw body
    pub fn new(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Create a request from an `http::Request`
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.headers, body)
    }

    /// Header value as a string; lookup is case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw request body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Message ID header
    pub fn message_id(&self) -> Option<&str> {
        self.header(HEADER_MESSAGE_ID)
    }

    /// Message timestamp header
    pub fn message_timestamp(&self) -> Option<&str> {
        self.header(HEADER_MESSAGE_TIMESTAMP)
    }

    /// Message signature header
    pub fn message_signature(&self) -> Option<&str> {
        self.header(HEADER_MESSAGE_SIGNATURE)
    }

    /// Message type header
    pub fn message_type(&self) -> Option<&str> {
        self.header(HEADER_MESSAGE_TYPE)
    }

    /// Subscription type header
    pub fn subscription_type(&self) -> Option<&str> {
        self.header(HEADER_SUBSCRIPTION_TYPE)
    }
}

/// Acknowledgement sent back to the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResponse {
    /// 200 with the challenge echoed as plain text
    Challenge(String),
    /// 204 with no body
    NoContent,
    /// 403, signature check failed
    Forbidden,
}

impl WebhookResponse {
    /// HTTP status of this response
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Challenge(_) => StatusCode::OK,
            Self::NoContent => StatusCode::NO_CONTENT,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// Response body, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Challenge(challenge) => Some(challenge),
            _ => None,
        }
    }

    /// Convert into an `http::Response`
    pub fn into_http(self) -> http::Response<Bytes> {
        let status = self.status();
        let mut response = match self {
            Self::Challenge(challenge) => {
                let mut response = http::Response::new(Bytes::from(challenge));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                response
            }
            Self::NoContent | Self::Forbidden => http::Response::new(Bytes::new()),
        };
        *response.status_mut() = status;
        response
    }
}
