//! Cold-start sequencing against a fake model server.
//!
//! The supervised process is stubbed with coreutils (`sleep` for a
//! long-lived process, `true` for one that exits immediately) while a
//! local mock answers the HTTP readiness and listing probes on the
//! configured port.

use std::sync::atomic::{AtomicUsize, Ordering};

use model_garden_worker::cache::CacheStore;
use model_garden_worker::config::ServerConfig;
use model_garden_worker::error::{Error, Result};
use model_garden_worker::lifecycle::{BackendInstance, BackendState};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct MockStore {
    commits: AtomicUsize,
}

#[async_trait::async_trait]
impl CacheStore for MockStore {
    async fn commit(&self) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn server_config(binary: &str, args: &[&str], port: u16) -> ServerConfig {
    ServerConfig {
        binary: binary.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        port,
        startup_timeout_secs: 3,
        pull_timeout_secs: 5,
        shutdown_timeout_secs: 1,
        ..Default::default()
    }
}

/// A bound-then-dropped listener yields a port nothing answers on.
fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_cold_start_reaches_ready_with_warm_cache() {
    let probe = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
        .mount(&probe)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "models": [{ "name": "alpha:latest" }] })),
        )
        .mount(&probe)
        .await;

    let port = probe.address().port();
    let instance = BackendInstance::new(server_config("sleep", &["60"], port));
    let store = MockStore::default();

    instance
        .start(&["alpha".to_string()], &store)
        .await
        .unwrap();

    assert_eq!(instance.state().await, BackendState::Ready);
    assert_eq!(store.commits.load(Ordering::SeqCst), 0);

    instance.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_server_times_out_as_unhealthy() {
    let instance = BackendInstance::new(ServerConfig {
        startup_timeout_secs: 1,
        ..server_config("sleep", &["60"], unused_port())
    });
    let store = MockStore::default();

    let result = instance.start(&[], &store).await;

    assert!(matches!(result, Err(Error::StartupTimeout(_))));
    assert_eq!(instance.state().await, BackendState::Unhealthy);
    assert_eq!(store.commits.load(Ordering::SeqCst), 0);

    instance.shutdown().await;
}

#[tokio::test]
async fn test_server_process_death_is_detected_before_timeout() {
    let instance = BackendInstance::new(server_config("true", &[], unused_port()));
    let store = MockStore::default();

    let result = instance.start(&[], &store).await;

    assert!(matches!(result, Err(Error::ProcessDied)));
    assert_eq!(instance.state().await, BackendState::Unhealthy);
}

#[tokio::test]
async fn test_provision_failure_parks_instance_unhealthy() {
    let probe = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&probe)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&probe)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(500).set_body_string("no space left"))
        .mount(&probe)
        .await;

    let port = probe.address().port();
    let instance = BackendInstance::new(server_config("sleep", &["60"], port));
    let store = MockStore::default();

    let result = instance.start(&["alpha".to_string()], &store).await;

    match result {
        Err(Error::Provision { model, .. }) => assert_eq!(model, "alpha"),
        other => panic!("Expected Provision error, got {:?}", other),
    }
    assert_eq!(instance.state().await, BackendState::Unhealthy);
    assert_eq!(store.commits.load(Ordering::SeqCst), 0);

    instance.shutdown().await;
}

#[tokio::test]
async fn test_health_check_reflects_server_reachability() {
    let probe = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&probe)
        .await;

    let port = probe.address().port();
    let reachable = BackendInstance::new(server_config("sleep", &["60"], port));
    let health = reachable.health_check().await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.port, Some(port));
    assert!(health.error.is_none());

    let unreachable = BackendInstance::new(server_config("sleep", &["60"], unused_port()));
    let health = unreachable.health_check().await;
    assert_eq!(health.status, "unhealthy");
    assert!(health.error.is_some());
}
