//! Backend lifecycle: cold start, readiness polling, provisioning, health.
//!
//! One `BackendInstance` owns one model-server process. The happy path is
//! `Cold -> Starting -> Provisioning -> Ready`; any failure parks the
//! instance in `Unhealthy`, from which there is no automatic recovery.
//! A replacement instance comes from the surrounding scaler.

use std::process::Stdio;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tokio::sync::RwLock;

use crate::cache::{CacheStore, Provisioner};
use crate::config::ServerConfig;
use crate::error::{Error, Result};

const READY_POLL_INTERVAL_MS: u64 = 250;
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Lifecycle state of a backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    Cold,
    Starting,
    Provisioning,
    Ready,
    Unhealthy,
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendState::Cold => "cold",
            BackendState::Starting => "starting",
            BackendState::Provisioning => "provisioning",
            BackendState::Ready => "ready",
            BackendState::Unhealthy => "unhealthy",
        };
        f.write_str(name)
    }
}

/// Advisory health report. Produced on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendHealth {
    fn healthy(port: u16) -> Self {
        Self {
            status: "healthy",
            port: Some(port),
            error: None,
        }
    }

    fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            port: None,
            error: Some(error.into()),
        }
    }
}

/// Supervises a single model-server process through its cold-start
/// sequence and exposes advisory health checks.
pub struct BackendInstance {
    config: ServerConfig,
    http_client: Client,
    state: RwLock<BackendState>,
    process: RwLock<Option<Child>>,
}

impl BackendInstance {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
            state: RwLock::new(BackendState::Cold),
            process: RwLock::new(None),
        }
    }

    /// Local address of the supervised server.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.config.port)
    }

    pub async fn state(&self) -> BackendState {
        *self.state.read().await
    }

    async fn set_state(&self, state: BackendState) {
        *self.state.write().await = state;
        tracing::info!(state = %state, "backend state changed");
    }

    /// Run the full cold-start sequence: launch the server, wait for it
    /// to become reachable, provision the desired models. Any failure is
    /// fatal and leaves the instance `Unhealthy`.
    pub async fn start<S: CacheStore>(&self, desired_models: &[String], store: &S) -> Result<()> {
        match self.start_inner(desired_models, store).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.set_state(BackendState::Unhealthy).await;
                Err(e)
            }
        }
    }

    async fn start_inner<S: CacheStore>(&self, desired_models: &[String], store: &S) -> Result<()> {
        self.set_state(BackendState::Starting).await;
        self.spawn_server().await?;
        self.wait_for_ready().await?;

        self.set_state(BackendState::Provisioning).await;
        let provisioner = Provisioner::new(
            self.http_client.clone(),
            self.base_url(),
            self.config.pull_timeout_secs,
        );
        let pulled = provisioner.provision(desired_models, store).await?;
        if pulled > 0 {
            tracing::info!(pulled, "new models cached to durable store");
        }

        self.set_state(BackendState::Ready).await;
        Ok(())
    }

    async fn spawn_server(&self) -> Result<()> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(&self.config.args)
            .env("OLLAMA_HOST", format!("0.0.0.0:{}", self.config.port))
            .env("OLLAMA_MODELS", &self.config.model_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if self.config.log_server_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = cmd
            .spawn()
            .map_err(|e| Error::Spawn(format!("{}: {}", self.config.binary, e)))?;

        tracing::info!(
            pid = ?child.id(),
            port = self.config.port,
            "spawned model server"
        );

        *self.process.write().await = Some(child);
        Ok(())
    }

    /// Poll the server's base endpoint until it answers, bounded by the
    /// configured startup timeout. A fixed post-spawn delay would race
    /// against slow model-weight loads, so readiness is always observed,
    /// never assumed.
    async fn wait_for_ready(&self) -> Result<()> {
        let timeout = Duration::from_secs(self.config.startup_timeout_secs);
        let start = Instant::now();
        let url = format!("{}/", self.base_url());

        loop {
            if start.elapsed() > timeout {
                return Err(Error::StartupTimeout(start.elapsed()));
            }

            if !self.is_process_alive().await {
                return Err(Error::ProcessDied);
            }

            if let Ok(response) = self.http_client.get(&url).send().await {
                if response.status().is_success() {
                    tracing::info!(elapsed = ?start.elapsed(), "model server reachable");
                    return Ok(());
                }
            }

            tokio::time::sleep(Duration::from_millis(READY_POLL_INTERVAL_MS)).await;
        }
    }

    async fn is_process_alive(&self) -> bool {
        let mut process = self.process.write().await;
        if let Some(ref mut child) = *process {
            matches!(child.try_wait(), Ok(None))
        } else {
            false
        }
    }

    /// Advisory probe of the server's base endpoint with a short timeout.
    /// Any reachable response is healthy; this never mutates lifecycle
    /// state.
    pub async fn health_check(&self) -> BackendHealth {
        let url = format!("{}/", self.base_url());

        match self
            .http_client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                BackendHealth::healthy(self.config.port)
            }
            Ok(response) => BackendHealth::unhealthy(format!(
                "model server returned {}",
                response.status()
            )),
            Err(e) => BackendHealth::unhealthy(e.to_string()),
        }
    }

    /// Terminate the server process gracefully: SIGTERM, bounded wait,
    /// then kill.
    pub async fn shutdown(&self) {
        let mut process_guard = self.process.write().await;
        if let Some(mut child) = process_guard.take() {
            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                if let Some(pid) = child.id() {
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                }
            }

            let wait_result = tokio::time::timeout(
                Duration::from_secs(self.config.shutdown_timeout_secs),
                child.wait(),
            )
            .await;

            match wait_result {
                Ok(Ok(status)) => {
                    tracing::debug!("model server exited with {}", status);
                }
                Ok(Err(e)) => {
                    tracing::warn!("error waiting for model server: {}", e);
                }
                Err(_timeout) => {
                    tracing::warn!("model server did not stop gracefully, killing");
                    let _ = child.kill().await;
                }
            }
        }
    }
}
