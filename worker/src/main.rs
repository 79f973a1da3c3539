//! Model Garden worker - cold-starts a model server and keeps it observable.
//!
//! The worker runs the full startup sequence (launch, readiness wait,
//! model provisioning, cache commit) before serving its admin API. A
//! failed startup exits the process so the surrounding scaler replaces
//! the instance.

use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use model_garden_worker::api::{self, AdminState};
use model_garden_worker::cache::FsCacheStore;
use model_garden_worker::config::Config;
use model_garden_worker::lifecycle::BackendInstance;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        binary = %config.server.binary,
        port = config.server.port,
        models = ?config.models.desired,
        "Starting Model Garden worker"
    );

    let backend = Arc::new(BackendInstance::new(config.server.clone()));
    let store = FsCacheStore::new(&config.server.model_dir);

    backend.start(&config.models.desired, &store).await?;
    tracing::info!("backend ready, accepting proxy traffic on port {}", config.server.port);

    let state = Arc::new(AdminState {
        backend: backend.clone(),
        started_at: chrono::Utc::now(),
    });
    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.admin.host, config.admin.port);
    tracing::info!("Admin API listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    backend.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
