pub mod config;
pub mod error;
pub mod proxy;
pub mod route;
pub mod routes;
pub mod tokens;

pub use config::Config;
pub use proxy::{ProxyEngine, ProxyResult};
pub use route::GatewayRoute;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub proxy: ProxyEngine,
}
