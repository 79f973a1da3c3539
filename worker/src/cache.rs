//! Model cache coordination.
//!
//! Decides which desired models are missing from the server's live
//! listing, pulls them in order, and commits the durable store when (and
//! only when) new artifacts were written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Response from the server's /api/tags listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl TagsResponse {
    /// Exact-name membership test against the parsed listing entries.
    /// A bare model name also matches its `:latest` tag, which is how the
    /// server lists untagged pulls.
    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|entry| {
            entry.name == model
                || (!model.contains(':') && entry.name == format!("{}:latest", model))
        })
    }
}

/// Durable store holding the model artifacts the server writes under its
/// cache mount.
///
/// `commit` persists whatever was written since the last commit. It is
/// cheap to call but only called when new data exists.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn commit(&self) -> Result<()>;
}

/// Cache store backed by a mounted directory.
pub struct FsCacheStore {
    path: PathBuf,
}

impl FsCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn commit(&self) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || sync_tree(&path))
            .await
            .map_err(|e| Error::Commit(e.to_string()))?
            .map_err(|e| Error::Commit(e.to_string()))?;

        tracing::info!(path = %self.path.display(), "cache store committed");
        Ok(())
    }
}

/// Flush a directory tree to stable storage: every regular file first,
/// then the directory entries themselves, bottom-up. Syncing only the
/// top-level directory inode would leave the artifact contents unflushed.
fn sync_tree(path: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            sync_tree(&entry.path())?;
        } else if file_type.is_file() {
            std::fs::File::open(entry.path())?.sync_all()?;
        }
    }
    std::fs::File::open(path)?.sync_all()
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// Provisions the desired model set against a running server.
pub struct Provisioner {
    http_client: Client,
    base_url: String,
    pull_timeout: Duration,
}

impl Provisioner {
    pub fn new(http_client: Client, base_url: String, pull_timeout_secs: u64) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pull_timeout: Duration::from_secs(pull_timeout_secs),
        }
    }

    /// Query the server's current model listing.
    pub async fn installed(&self) -> Result<TagsResponse> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Communication(format!(
                "model listing returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Communication(e.to_string()))
    }

    /// Pull every desired model missing from the listing, in the given
    /// order, sequentially, failing fast. Commits the store exactly once
    /// iff at least one model was newly pulled. Returns the pull count.
    pub async fn provision<S: CacheStore>(&self, desired: &[String], store: &S) -> Result<usize> {
        let installed = self.installed().await?;
        let mut pulled = 0usize;

        for model in desired {
            if installed.contains(model) {
                tracing::info!(model = %model, "model already cached");
                continue;
            }

            tracing::info!(model = %model, "pulling model");
            self.pull(model).await?;
            pulled += 1;
            tracing::info!(model = %model, "model pulled");
        }

        if pulled > 0 {
            store.commit().await?;
        }

        Ok(pulled)
    }

    async fn pull(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .timeout(self.pull_timeout)
            .json(&PullRequest {
                name: model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| Error::Provision {
                model: model.to_string(),
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provision {
                model: model.to_string(),
                detail: format!("{}: {}", status, body),
            });
        }

        Ok(())
    }
}
