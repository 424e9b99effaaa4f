//! Subscription declaration and registration.
//!
//! Components declare [`SubscriptionSpec`]s; the [`SubscriptionRegistry`]
//! collects them and creates matching webhook subscriptions at startup.

mod registry;
mod spec;

pub use registry::{
    delete_subscription, list_subscriptions, register_subscriptions, DeclaredSubscription,
    RegistrationFailure, RegistrationMode, RegistrationReport, SubscriptionComponent,
    SubscriptionRegistry,
};
pub use spec::{ConditionValue, SubscriptionSpec, SubscriptionSpecBuilder, DEFAULT_VERSION};
