//! Admin API for external observers (the scaler, operators).
//!
//! Deliberately small: lifecycle state and an on-demand health probe.
//! Proxy traffic goes straight to the supervised server's own port.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lifecycle::{BackendHealth, BackendInstance, BackendState};

pub struct AdminState {
    pub backend: Arc<BackendInstance>,
    pub started_at: DateTime<Utc>,
}

/// Build the admin router.
pub fn router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    state: BackendState,
    started_at: DateTime<Utc>,
    uptime_secs: i64,
}

/// GET /status - current lifecycle state, without probing the server.
async fn status(State(state): State<Arc<AdminState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        state: state.backend.state().await,
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /healthz - live probe of the supervised server. Advisory only;
/// a failing probe does not change lifecycle state.
async fn healthz(State(state): State<Arc<AdminState>>) -> Json<BackendHealth> {
    Json(state.backend.health_check().await)
}
