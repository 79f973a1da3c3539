//! Configuration for the worker.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the worker.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// The supervised model-server process.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server binary (default: "ollama").
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Arguments passed to the binary (default: ["serve"]).
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Port the server binds on all interfaces.
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Durable cache mount where the server stores model artifacts.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// Overall readiness timeout for the cold start (default: 120).
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
    /// Timeout for a single model pull. Pulls may download many GB.
    #[serde(default = "default_pull_timeout")]
    pub pull_timeout_secs: u64,
    /// Graceful shutdown timeout before the process is killed.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
    /// Inherit the server's stdout/stderr for debugging.
    #[serde(default)]
    pub log_server_output: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: default_args(),
            port: default_server_port(),
            model_dir: default_model_dir(),
            startup_timeout_secs: default_startup_timeout(),
            pull_timeout_secs: default_pull_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            log_server_output: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModelsConfig {
    /// Models that must be cached before the instance reports ready,
    /// provisioned in this order.
    #[serde(default)]
    pub desired: Vec<String>,
}

/// Admin API for external observers (the scaler, operators).
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_admin_port(),
        }
    }
}

// Default values
fn default_binary() -> String {
    "ollama".to_string()
}
fn default_args() -> Vec<String> {
    vec!["serve".to_string()]
}
fn default_server_port() -> u16 {
    11434
}
fn default_model_dir() -> String {
    "/models/.ollama".to_string()
}
fn default_startup_timeout() -> u64 {
    120
}
fn default_pull_timeout() -> u64 {
    1800
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_admin_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (WORKER__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("WORKER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
