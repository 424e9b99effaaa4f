//! Registry of declared subscriptions and their registration with the API.

use super::SubscriptionSpec;
use crate::config::EventSubConfig;
use crate::errors::{ConfigurationError, EventSubError, EventSubResult};
use crate::services::eventsub::{
    CreateSubscriptionRequest, EventSubApi, ListSubscriptionsRequest, SubscriptionRecord,
};
use parking_lot::Mutex;
use secrecy::SecretString;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// A consumer component that declares the subscriptions it needs
pub trait SubscriptionComponent: Send + Sync {
    /// Identity used to reject duplicate registration
    fn component_name(&self) -> &str;

    /// Subscriptions this component wants delivered
    fn declare_subscriptions(&self) -> Vec<SubscriptionSpec>;
}

/// How `register_all` treats subscriptions that may already exist remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationMode {
    /// Issue a create call for every declared spec
    #[default]
    AlwaysCreate,
    /// List existing subscriptions first and skip specs already satisfied
    SkipExisting,
}

/// A subscription together with the component that declared it
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredSubscription {
    /// Name of the declaring component
    pub component: String,
    /// What it asked for
    pub spec: SubscriptionSpec,
}

impl DeclaredSubscription {
    /// Pair `spec` with its owning component
    pub fn new(component: impl Into<String>, spec: SubscriptionSpec) -> Self {
        Self {
            component: component.into(),
            spec,
        }
    }
}

/// A subscription the remote side refused
#[derive(Debug)]
pub struct RegistrationFailure {
    /// Component that declared it
    pub component: String,
    /// The subscription that failed
    pub spec: SubscriptionSpec,
    /// Why it failed
    pub error: EventSubError,
}

/// Outcome of one registration pass
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Subscriptions created in this pass
    pub created: Vec<SubscriptionRecord>,
    /// Declarations that already existed remotely
    pub existing: Vec<DeclaredSubscription>,
    /// Specs that could not be registered
    pub failed: Vec<RegistrationFailure>,
}

impl RegistrationReport {
    /// Number of specs processed
    pub fn attempted(&self) -> usize {
        self.created.len() + self.existing.len() + self.failed.len()
    }

    /// True when nothing failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    specs: Vec<SubscriptionSpec>,
}

/// Ordered set of components and the subscriptions they declared
///
/// Appends are guarded by a mutex so components may be added from
/// concurrent initialization code; reads take a snapshot.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component's specs under `component`
    pub fn add(&self, component: impl Into<String>, specs: Vec<SubscriptionSpec>) -> EventSubResult<()> {
        let name = component.into();
        let mut entries = self.entries.lock();

        if entries.iter().any(|e| e.name == name) {
            return Err(ConfigurationError::DuplicateComponent { component: name }.into());
        }

        debug!(component = %name, count = specs.len(), "Component added");
        entries.push(Entry { name, specs });
        Ok(())
    }

    /// Add a component using its own declaration
    pub fn register_component(&self, component: &dyn SubscriptionComponent) -> EventSubResult<()> {
        self.add(component.component_name(), component.declare_subscriptions())
    }

    /// All declared specs, in component then declaration order
    pub fn specs(&self) -> Vec<SubscriptionSpec> {
        self.entries
            .lock()
            .iter()
            .flat_map(|e| e.specs.iter().cloned())
            .collect()
    }

    /// All declarations paired with their component, in registration order
    pub fn declared(&self) -> Vec<DeclaredSubscription> {
        self.entries
            .lock()
            .iter()
            .flat_map(|e| {
                e.specs
                    .iter()
                    .map(|spec| DeclaredSubscription::new(e.name.clone(), spec.clone()))
            })
            .collect()
    }

    /// Names of the registered components, in insertion order
    pub fn components(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.name.clone()).collect()
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no component has been added
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Register every declared spec with the remote API
    pub async fn register_all(
        &self,
        api: &dyn EventSubApi,
        callback_url: &str,
        secret: &SecretString,
        mode: RegistrationMode,
    ) -> RegistrationReport {
        let declared = self.declared();
        register_subscriptions(api, &declared, callback_url, secret, mode).await
    }

    /// Register every declared spec using the secret and callback from `config`
    ///
    /// Fails before any remote call when either is missing.
    pub async fn setup(&self, api: &dyn EventSubApi, config: &EventSubConfig) -> EventSubResult<RegistrationReport> {
        let secret = config.require_secret()?;
        let callback_url = config.require_callback_url()?;

        Ok(self
            .register_all(api, callback_url.as_str(), secret, config.registration_mode)
            .await)
    }
}

/// Create subscriptions for `declared` in order
///
/// A failure for one subscription is logged and recorded against its
/// component; the pass always continues with the next one.
#[instrument(skip(api, declared, secret), fields(count = declared.len()))]
pub async fn register_subscriptions(
    api: &dyn EventSubApi,
    declared: &[DeclaredSubscription],
    callback_url: &str,
    secret: &SecretString,
    mode: RegistrationMode,
) -> RegistrationReport {
    let mut report = RegistrationReport::default();

    let existing = match mode {
        RegistrationMode::AlwaysCreate => Vec::new(),
        RegistrationMode::SkipExisting => match list_subscriptions(api, None, None).await {
            Ok(records) => records.into_iter().filter(|r| r.is_active()).collect(),
            Err(e) => {
                warn!(error = %e, "Could not list existing subscriptions, creating all");
                Vec::new()
            }
        },
    };

    for item in declared {
        let DeclaredSubscription { component, spec } = item;

        if existing.iter().any(|r| r.matches(spec, callback_url)) {
            debug!(component = %component, subscription_type = spec.event_type(), "Subscription already exists");
            report.existing.push(item.clone());
            continue;
        }

        let request = CreateSubscriptionRequest::webhook(spec, callback_url, secret.clone());
        match api.create_subscription(request).await {
            Ok(record) => {
                info!(
                    component = %component,
                    subscription_type = spec.event_type(),
                    subscription_id = %record.id,
                    "Subscription registered"
                );
                report.created.push(record);
            }
            Err(e) if e.is_conflict() => {
                info!(component = %component, subscription_type = spec.event_type(), "Subscription already exists");
                report.existing.push(item.clone());
            }
            Err(e) => {
                error!(
                    component = %component,
                    subscription_type = spec.event_type(),
                    version = spec.version(),
                    error_code = e.error_code(),
                    error = %e,
                    "Subscription registration failed"
                );
                report.failed.push(RegistrationFailure {
                    component: component.clone(),
                    spec: spec.clone(),
                    error: e,
                });
            }
        }
    }

    report
}

/// List every subscription matching the filters, following pagination
///
/// Stops when the API stops returning a cursor or returns one already
/// followed.
pub async fn list_subscriptions(
    api: &dyn EventSubApi,
    status: Option<&str>,
    subscription_type: Option<&str>,
) -> EventSubResult<Vec<SubscriptionRecord>> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen = HashSet::new();

    loop {
        let mut request = ListSubscriptionsRequest::new();
        if let Some(status) = status {
            request = request.status(status);
        }
        if let Some(subscription_type) = subscription_type {
            request = request.subscription_type(subscription_type);
        }
        if let Some(after) = &cursor {
            request = request.after(after.clone());
        }

        let page = api.list_subscriptions(request).await?;
        let next = page.next_cursor().map(str::to_string);
        records.extend(page.data);

        match next {
            Some(next) if seen.insert(next.clone()) => cursor = Some(next),
            Some(next) => {
                warn!(cursor = %next, "Pagination cursor repeated, stopping");
                break;
            }
            None => break,
        }
    }

    Ok(records)
}

/// Delete a subscription by ID
pub async fn delete_subscription(api: &dyn EventSubApi, id: &str) -> EventSubResult<()> {
    api.delete_subscription(id).await
}
