//! Gateway configuration.
//!
//! One config value object is built in `main` and owned by the app state;
//! request handlers never read the environment themselves.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub scaling: ScalingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// The single backend this gateway fronts.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Backend identity, used in logs and the service description.
    #[serde(default = "default_backend_name")]
    pub name: String,
    /// Base URL of the backend's model-server API.
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Timeout for buffered relays. Generous, request bodies may
    /// represent long-running generations.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: default_backend_name(),
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Request classification knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Path suffixes acknowledged locally instead of waking a backend.
    #[serde(default = "default_telemetry_paths")]
    pub telemetry_paths: Vec<String>,
    /// Path answered locally with a token estimate.
    #[serde(default = "default_count_tokens_path")]
    pub count_tokens_path: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            telemetry_paths: default_telemetry_paths(),
            count_tokens_path: default_count_tokens_path(),
        }
    }
}

/// Knobs consumed by the surrounding deployment/scaling system.
/// The gateway only reports these at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalingConfig {
    #[serde(default = "default_min_gateways")]
    pub min_gateway_instances: u32,
    /// Accelerator class for backend instances (e.g. "A10G").
    #[serde(default = "default_accelerator")]
    pub backend_accelerator: String,
    #[serde(default = "default_max_backends")]
    pub backend_max_instances: u32,
    /// Idle window before a backend instance is scaled to zero.
    #[serde(default = "default_scaledown")]
    pub backend_scaledown_window_secs: u64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_gateway_instances: default_min_gateways(),
            backend_accelerator: default_accelerator(),
            backend_max_instances: default_max_backends(),
            backend_scaledown_window_secs: default_scaledown(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_backend_name() -> String {
    "ollama".to_string()
}
fn default_backend_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_request_timeout() -> u64 {
    600
}
fn default_telemetry_paths() -> Vec<String> {
    vec!["api/event".to_string(), "api/event/batch".to_string()]
}
fn default_count_tokens_path() -> String {
    "v1/messages/count_tokens".to_string()
}
fn default_min_gateways() -> u32 {
    1
}
fn default_accelerator() -> String {
    "A10G".to_string()
}
fn default_max_backends() -> u32 {
    1
}
fn default_scaledown() -> u64 {
    300
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (GATEWAY__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_config() {
        let api = ApiConfig::default();
        assert_eq!(api.host, "0.0.0.0");
        assert_eq!(api.port, 8080);
    }

    #[test]
    fn test_default_backend_config() {
        let backend = BackendConfig::default();
        assert_eq!(backend.base_url, "http://localhost:11434");
        assert_eq!(backend.request_timeout_secs, 600);
    }

    #[test]
    fn test_default_routing_config() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.telemetry_paths, vec!["api/event", "api/event/batch"]);
        assert_eq!(routing.count_tokens_path, "v1/messages/count_tokens");
    }

    #[test]
    fn test_default_scaling_config() {
        let scaling = ScalingConfig::default();
        assert_eq!(scaling.min_gateway_instances, 1);
        assert_eq!(scaling.backend_max_instances, 1);
        assert_eq!(scaling.backend_scaledown_window_secs, 300);
    }
}
