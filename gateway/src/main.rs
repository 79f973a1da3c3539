//! Model Garden gateway - the always-warm front door for model workers.

use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use model_garden_gateway::config::Config;
use model_garden_gateway::proxy::ProxyEngine;
use model_garden_gateway::{routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        backend = %config.backend.name,
        backend_url = %config.backend.base_url,
        accelerator = %config.scaling.backend_accelerator,
        max_backends = config.scaling.backend_max_instances,
        scaledown_secs = config.scaling.backend_scaledown_window_secs,
        "Starting Model Garden gateway"
    );

    let proxy = ProxyEngine::new(&config.backend);
    let state = Arc::new(AppState {
        config: config.clone(),
        proxy,
    });

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
