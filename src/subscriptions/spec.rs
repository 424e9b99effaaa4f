//! Declared subscription intents.

use serde::Serialize;
use std::collections::BTreeMap;

/// Default schema version when none is declared
pub const DEFAULT_VERSION: &str = "1";

/// A condition value as declared by a component
///
/// Deferred values are evaluated exactly once, when the spec is built,
/// and the result is frozen into the spec.
pub enum ConditionValue {
    /// A plain value
    Literal(String),
    /// A value computed at declaration time
    Deferred(Box<dyn FnOnce() -> String + Send>),
}

impl ConditionValue {
    /// Wrap a producer evaluated at declaration time
    pub fn deferred<F>(f: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        Self::Deferred(Box::new(f))
    }

    /// Produce the final string value
    pub fn resolve(self) -> String {
        match self {
            Self::Literal(value) => value,
            Self::Deferred(f) => f(),
        }
    }
}

impl std::fmt::Debug for ConditionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<u64> for ConditionValue {
    fn from(value: u64) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Literal(value.to_string())
    }
}

/// An immutable subscription intent: event type, version and condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSpec {
    #[serde(rename = "type")]
    event_type: String,
    version: String,
    condition: BTreeMap<String, String>,
}

impl SubscriptionSpec {
    /// Start declaring a subscription to `event_type`
    pub fn builder(event_type: impl Into<String>) -> SubscriptionSpecBuilder {
        SubscriptionSpecBuilder {
            event_type: event_type.into(),
            version: DEFAULT_VERSION.to_string(),
            condition: BTreeMap::new(),
        }
    }

    /// Event type, e.g. `channel.follow`
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Schema version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolved condition parameters
    pub fn condition(&self) -> &BTreeMap<String, String> {
        &self.condition
    }
}

/// Builder for [`SubscriptionSpec`]
#[derive(Debug)]
pub struct SubscriptionSpecBuilder {
    event_type: String,
    version: String,
    condition: BTreeMap<String, String>,
}

impl SubscriptionSpecBuilder {
    /// Set the schema version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a condition parameter, resolving deferred values immediately
    pub fn condition(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.condition.insert(key.into(), value.into().resolve());
        self
    }

    /// Add a condition parameter computed by `f`
    pub fn condition_with<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        self.condition(key, ConditionValue::deferred(f))
    }

    /// Finish the spec
    pub fn build(self) -> SubscriptionSpec {
        SubscriptionSpec {
            event_type: self.event_type,
            version: self.version,
            condition: self.condition,
        }
    }
}
