//! EventSub subscriptions service for the Helix API.
//!
//! Provides methods to create, list and delete webhook subscriptions.

mod requests;
mod responses;
mod service;

pub use requests::*;
pub use responses::*;
pub use service::*;
