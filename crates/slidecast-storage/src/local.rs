//! Filesystem publisher for development and tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::publisher::{public_url, validate_key, AssetPublisher};

/// Copies published assets under `root` and serves them from `base_url`.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    root: PathBuf,
    base_url: String,
}

impl LocalPublisher {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Create from `LOCAL_PUBLISH_DIR` / `LOCAL_PUBLIC_BASE_URL`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("LOCAL_PUBLISH_DIR").unwrap_or_else(|_| "/tmp/slidecast/public".to_string()),
            std::env::var("LOCAL_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/media".to_string()),
        )
    }

    /// Directory published assets are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn target(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        let target = self.root.join(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(target)
    }
}

#[async_trait]
impl AssetPublisher for LocalPublisher {
    async fn publish_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<String> {
        let target = self.target(key).await?;
        fs::copy(path, &target)
            .await
            .map_err(|e| StorageError::publish_failed(key, e.to_string()))?;
        debug!("Published {} to {}", path.display(), target.display());
        Ok(public_url(&self.base_url, key))
    }

    async fn publish_bytes(&self, data: Vec<u8>, key: &str, _content_type: &str) -> StorageResult<String> {
        let target = self.target(key).await?;
        fs::write(&target, data)
            .await
            .map_err(|e| StorageError::publish_failed(key, e.to_string()))?;
        Ok(public_url(&self.base_url, key))
    }

    async fn check_ready(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}
