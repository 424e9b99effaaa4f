//! Observability helpers for the EventSub integration.
//!
//! Spans and events go through `tracing`; this module keeps secrets and
//! signatures out of them.

pub mod logging;

pub use logging::*;
