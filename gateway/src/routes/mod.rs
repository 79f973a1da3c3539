//! HTTP surface of the gateway.

pub mod forward;
pub mod meta;

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;

use crate::AppState;

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(meta::root))
        .route("/health", get(meta::health))
        .route("/*path", any(forward::forward))
        .with_state(state)
}
