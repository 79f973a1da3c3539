//! Static service metadata. Neither endpoint contacts a backend.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

/// GET / - service description with an endpoint map.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "model-garden",
        "architecture": "gateway (always warm) + model workers (separate lifecycle)",
        "endpoints": {
            "/health": "Gateway health check",
            "/api/*": "Native model-server API (generate, chat, tags, show, embed)",
            "/v1/*": "OpenAI-compatible API (chat/completions, models)",
            "/v1/messages/count_tokens": "Local token estimation",
        },
    }))
}

/// GET /health - gateway liveness. Never probes workers: a probe would
/// cold-start a scaled-to-zero instance.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut backends = serde_json::Map::new();
    backends.insert(
        state.config.backend.name.clone(),
        json!({ "status": "available" }),
    );

    Json(json!({
        "status": "healthy",
        "backends": backends,
    }))
}
