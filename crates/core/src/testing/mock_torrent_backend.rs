//! Mock torrent backend for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent::metainfo::{encode_metainfo, single_file_info};
use crate::torrent::{
    HashProgress, ProgressCallback, TorrentBackend, TorrentError, TorrentRequest,
};

/// Mock implementation of the TorrentBackend trait.
///
/// Writes a small but valid single-file torrent to the requested output
/// path so the packager's artifact check passes, and records requests.
#[derive(Debug, Clone, Default)]
pub struct MockTorrentBackend {
    requests: Arc<RwLock<Vec<TorrentRequest>>>,
    next_error: Arc<RwLock<Option<TorrentError>>>,
}

impl MockTorrentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next creation with `error`.
    pub async fn set_next_error(&self, error: TorrentError) {
        *self.next_error.write().await = Some(error);
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<TorrentRequest> {
        self.requests.read().await.clone()
    }

    pub async fn create_count(&self) -> usize {
        self.requests.read().await.len()
    }

    fn artifact(request: &TorrentRequest) -> Result<Vec<u8>, TorrentError> {
        let name = request
            .content_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "content".to_string());

        let info = single_file_info(&name, 5, 32_768, vec![0u8; 20]);
        encode_metainfo(&info, &request.announces, request.source.as_deref())
    }
}

#[async_trait]
impl TorrentBackend for MockTorrentBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create(
        &self,
        request: &TorrentRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<(), TorrentError> {
        self.requests.write().await.push(request.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(callback) = progress {
            callback(&HashProgress {
                file: request.content_path.clone(),
                pieces_done: 1,
                pieces_total: 1,
            });
        }

        tokio::fs::write(&request.output_path, Self::artifact(request)?).await?;
        Ok(())
    }
}
