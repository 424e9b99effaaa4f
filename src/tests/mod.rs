//! Tests for the EventSub webhook and registration flows.

#[cfg(test)]
mod client_tests;

#[cfg(test)]
mod dispatcher_tests;

#[cfg(test)]
mod registry_tests;
