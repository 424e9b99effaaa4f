//! Service implementations for Helix API endpoints.

pub mod eventsub;

pub use eventsub::{EventSubApi, EventSubService};
