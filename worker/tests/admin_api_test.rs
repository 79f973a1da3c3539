//! Admin API surface.

use std::sync::Arc;

use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use model_garden_worker::api::{self, AdminState};
use model_garden_worker::config::ServerConfig;
use model_garden_worker::lifecycle::BackendInstance;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn admin_router(backend: BackendInstance) -> axum::Router {
    api::router(Arc::new(AdminState {
        backend: Arc::new(backend),
        started_at: Utc::now(),
    }))
}

#[tokio::test]
async fn test_status_reports_lifecycle_state() {
    let router = admin_router(BackendInstance::new(ServerConfig::default()));

    let (status, body) = get_json(router, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "cold");
    assert!(body["uptime_secs"].as_i64().is_some());
    assert!(body["started_at"].as_str().is_some());
}

#[tokio::test]
async fn test_healthz_probes_the_live_server() {
    let probe = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&probe)
        .await;

    let config = ServerConfig {
        port: probe.address().port(),
        ..ServerConfig::default()
    };
    let router = admin_router(BackendInstance::new(config));

    let (status, body) = get_json(router, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["port"].as_u64(), Some(u64::from(probe.address().port())));
}

#[tokio::test]
async fn test_healthz_surfaces_unreachable_server() {
    let config = ServerConfig {
        port: 1,
        ..ServerConfig::default()
    };
    let router = admin_router(BackendInstance::new(config));

    let (status, body) = get_json(router, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().is_some());
}
