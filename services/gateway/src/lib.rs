//! Single entry point for every analytics operation.
//!
//! Requests and responses are plain serde types, so any transport (HTTP
//! handler, message consumer, FFI shim) can embed the gateway without the
//! engine knowing about it.

pub mod router;

#[cfg(test)]
mod tests;

pub use router::{AnalyticsGateway, AnalyticsRequest, AnalyticsResponse, ScenarioOutcome};
