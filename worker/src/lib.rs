pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use cache::{CacheStore, FsCacheStore, Provisioner};
pub use config::Config;
pub use lifecycle::{BackendHealth, BackendInstance, BackendState};
