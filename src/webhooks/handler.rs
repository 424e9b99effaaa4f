//! Consumer-supplied handlers for delivered events.

use crate::errors::{ConfigurationError, EventSubResult};
use crate::events::EventEnvelope;
use async_trait::async_trait;

/// Receives notifications and revocations after they are authenticated
///
/// Both methods are required. Whatever a handler does internally, the
/// dispatcher acknowledges the message once the call returns.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called for every `notification` message
    async fn process_event(&self, event_type: &str, envelope: EventEnvelope);

    /// Called for every `revocation` message
    async fn process_revocation(&self, envelope: EventEnvelope);
}

type EventFn = Box<dyn Fn(&str, EventEnvelope) + Send + Sync>;
type RevocationFn = Box<dyn Fn(EventEnvelope) + Send + Sync>;

/// Handler built from closures
pub struct FnHandler {
    event_fn: EventFn,
    revocation_fn: RevocationFn,
}

impl FnHandler {
    /// Start building a closure handler
    pub fn builder() -> FnHandlerBuilder {
        FnHandlerBuilder::default()
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    async fn process_event(&self, event_type: &str, envelope: EventEnvelope) {
        (self.event_fn)(event_type, envelope);
    }

    async fn process_revocation(&self, envelope: EventEnvelope) {
        (self.revocation_fn)(envelope);
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Builder for [`FnHandler`]; refuses to build unless both closures are set
#[derive(Default)]
pub struct FnHandlerBuilder {
    event_fn: Option<EventFn>,
    revocation_fn: Option<RevocationFn>,
}

impl FnHandlerBuilder {
    /// Set the notification handler
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, EventEnvelope) + Send + Sync + 'static,
    {
        self.event_fn = Some(Box::new(f));
        self
    }

    /// Set the revocation handler
    pub fn on_revocation<F>(mut self, f: F) -> Self
    where
        F: Fn(EventEnvelope) + Send + Sync + 'static,
    {
        self.revocation_fn = Some(Box::new(f));
        self
    }

    /// Build the handler
    pub fn build(self) -> EventSubResult<FnHandler> {
        let event_fn = self.event_fn.ok_or(ConfigurationError::MissingHandler {
            name: "process_event",
        })?;
        let revocation_fn = self.revocation_fn.ok_or(ConfigurationError::MissingHandler {
            name: "process_revocation",
        })?;

        Ok(FnHandler {
            event_fn,
            revocation_fn,
        })
    }
}
