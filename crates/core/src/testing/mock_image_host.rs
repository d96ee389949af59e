//! Mock image host for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::snapshot::{ImageHost, SnapshotError};

/// Mock implementation of the ImageHost trait.
///
/// Every upload answers `https://img.test/{file name}` unless the path was
/// marked as failing.
#[derive(Debug, Clone, Default)]
pub struct MockImageHost {
    uploaded: Arc<RwLock<Vec<PathBuf>>>,
    failing: Arc<RwLock<HashSet<PathBuf>>>,
    authenticated: Arc<AtomicBool>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject uploads of `path`.
    pub async fn fail_path(&self, path: PathBuf) {
        self.failing.write().await.insert(path);
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Paths uploaded successfully, in completion order.
    pub async fn uploaded(&self) -> Vec<PathBuf> {
        self.uploaded.read().await.clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    fn name(&self) -> &str {
        "mock"
    }

    fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn upload(&self, path: &Path) -> Result<String, SnapshotError> {
        if self.failing.read().await.contains(path) {
            return Err(SnapshotError::UploadFailed(format!(
                "rejected {}",
                path.display()
            )));
        }

        self.uploaded.write().await.push(path.to_path_buf());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(format!("https://img.test/{}", file_name))
    }
}
