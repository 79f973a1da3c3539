//! The generic forward surface: classify, then short-circuit, compute
//! locally, or relay.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use crate::route::{classify, GatewayRoute};
use crate::tokens::estimate_tokens;
use crate::AppState;

/// GET|POST|DELETE /{*path} - wildcard handler for everything that is not
/// gateway metadata. Other methods fall through to the proxy's 405.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    method: Method,
    raw_body: Bytes,
) -> Response {
    // Bodies are opaque documents. A request without a parseable JSON
    // body classifies the same as a bodyless one.
    let body: Option<Value> = if raw_body.is_empty() {
        None
    } else {
        serde_json::from_slice(&raw_body).ok()
    };

    match classify(&path, body.as_ref(), &state.config.routing) {
        GatewayRoute::ShortCircuit => {
            tracing::debug!(path, "short-circuiting telemetry path");
            Json(json!({ "status": "ok" })).into_response()
        }
        GatewayRoute::CountTokens => {
            let input_tokens = estimate_tokens(body.as_ref().unwrap_or(&Value::Null));
            Json(json!({ "input_tokens": input_tokens })).into_response()
        }
        GatewayRoute::Forward { stream } => {
            let result = if stream {
                state.proxy.forward_stream(&method, &path, body.as_ref()).await
            } else {
                state.proxy.forward_sync(&method, &path, body.as_ref()).await
            };

            match result {
                Ok(proxied) => proxied.into_response(),
                Err(e) => {
                    tracing::warn!(path, error = %e, "relay failed");
                    e.into_response()
                }
            }
        }
    }
}
