//! Resilience patterns for outbound API calls.

pub mod retry;

pub use retry::{with_retry, CreateRetryPolicy, DefaultRetryPolicy, RetryConfig, RetryPolicy};
