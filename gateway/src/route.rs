//! Request classification.
//!
//! Every inbound request is classified exactly once, from its path and
//! body, before any backend is involved. The classification is immutable
//! for the lifetime of the request.

use serde_json::Value;

use crate::config::RoutingConfig;

/// How the gateway handles an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayRoute {
    /// Telemetry and other no-consequence paths: acknowledge locally.
    /// Waking a cold backend for these would be pure waste.
    ShortCircuit,
    /// Token estimation, answered entirely in the gateway.
    CountTokens,
    /// Relay to the backend, buffered or streaming.
    Forward { stream: bool },
}

/// Classify a request from its path and optional parsed body.
pub fn classify(path: &str, body: Option<&Value>, routing: &RoutingConfig) -> GatewayRoute {
    let path = path.trim_start_matches('/');

    if routing
        .telemetry_paths
        .iter()
        .any(|suffix| path.ends_with(suffix.as_str()))
    {
        return GatewayRoute::ShortCircuit;
    }

    if path == routing.count_tokens_path {
        return GatewayRoute::CountTokens;
    }

    GatewayRoute::Forward {
        stream: wants_stream(body),
    }
}

/// A request streams iff its body carries `"stream": true` as a JSON
/// boolean. Truthy strings do not count.
fn wants_stream(body: Option<&Value>) -> bool {
    body.and_then(|b| b.get("stream"))
        .map_or(false, |v| *v == Value::Bool(true))
}
