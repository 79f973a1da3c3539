//! Error types for the worker.
//!
//! Everything here is fatal during startup: a worker that cannot reach
//! `Ready` has no usable partial state and must be replaced.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to spawn model server: {0}")]
    Spawn(String),

    #[error("Model server did not become reachable within {0:?}")]
    StartupTimeout(Duration),

    #[error("Model server process exited during startup")]
    ProcessDied,

    #[error("Failed to provision model {model}: {detail}")]
    Provision { model: String, detail: String },

    #[error("Cache commit failed: {0}")]
    Commit(String),

    #[error("Server communication error: {0}")]
    Communication(String),
}

pub type Result<T> = std::result::Result<T, Error>;
