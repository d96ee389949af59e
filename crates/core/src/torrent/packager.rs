//! Builds or reuses the `.torrent` artifact of a release.

use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TorrentConfig;

use super::error::TorrentError;
use super::hasher::BuiltinBackend;
use super::inspect::inspect_torrent;
use super::mkbrr::MkbrrBackend;
use super::traits::TorrentBackend;
use super::trackers::{fetch_public_trackers, merge_announces};
use super::types::{
    artifact_path, PackagedTorrent, ProgressCallback, TorrentBackendKind, TorrentRequest,
};

/// Creates torrent artifacts at `{cache_dir}/{name}.torrent`.
pub struct TorrentPackager {
    backend: Arc<dyn TorrentBackend>,
    client: Client,
    source: String,
    piece_length: Option<u64>,
    public_tracker_url: Option<String>,
    progress: Option<ProgressCallback>,
}

impl TorrentPackager {
    /// Create a packager around an explicit backend.
    pub fn new(backend: Arc<dyn TorrentBackend>, config: &TorrentConfig) -> Result<Self, TorrentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TorrentError::TrackerFetch(e.to_string()))?;

        Ok(Self {
            backend,
            client,
            source: config.source.clone(),
            piece_length: config.piece_length,
            public_tracker_url: config
                .add_public_trackers
                .then(|| config.public_tracker_url.clone()),
            progress: None,
        })
    }

    /// Create a packager with the backend selected in configuration.
    pub fn from_config(config: &TorrentConfig) -> Result<Self, TorrentError> {
        let backend: Arc<dyn TorrentBackend> = match config.backend {
            TorrentBackendKind::Builtin => Arc::new(BuiltinBackend::new()),
            TorrentBackendKind::Mkbrr => Arc::new(MkbrrBackend::new(config.mkbrr_path.clone())),
        };
        Self::new(backend, config)
    }

    /// Report hashing progress to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Build the artifact for `content_path`, or reuse the existing one.
    ///
    /// An existing artifact is returned untouched unless `overwrite` is set,
    /// in which case it is deleted and regenerated.
    pub async fn package(
        &self,
        name: &str,
        content_path: &Path,
        cache_dir: &Path,
        announces: &[String],
        overwrite: bool,
    ) -> Result<PackagedTorrent, TorrentError> {
        let output_path = artifact_path(cache_dir, name);

        if output_path.exists() {
            if !overwrite {
                debug!(path = %output_path.display(), "Reusing existing torrent");
                return Ok(PackagedTorrent {
                    path: output_path,
                    reused: true,
                });
            }
            tokio::fs::remove_file(&output_path).await?;
        }

        if !content_path.exists() {
            return Err(TorrentError::ContentNotFound {
                path: content_path.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(cache_dir).await?;

        let mut all_announces = announces.to_vec();
        if let Some(url) = &self.public_tracker_url {
            match fetch_public_trackers(&self.client, url).await {
                Ok(trackers) => merge_announces(&mut all_announces, trackers),
                Err(e) => warn!(error = %e, "Continuing without public trackers"),
            }
        }

        let request = TorrentRequest {
            content_path: content_path.to_path_buf(),
            output_path: output_path.clone(),
            announces: all_announces,
            source: Some(self.source.clone()).filter(|s| !s.is_empty()),
            piece_length: self.piece_length,
        };

        info!(
            name = %name,
            backend = self.backend.name(),
            trackers = request.announces.len(),
            "Creating torrent"
        );
        self.backend.create(&request, self.progress.clone()).await?;

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| TorrentError::invalid_artifact(&output_path, e.to_string()))?;
        let summary = inspect_torrent(&bytes)
            .map_err(|reason| TorrentError::invalid_artifact(&output_path, reason))?;
        info!(
            info_hash = %summary.info_hash,
            files = summary.files.len(),
            size = summary.total_size,
            "Torrent created"
        );

        Ok(PackagedTorrent {
            path: output_path,
            reused: false,
        })
    }
}
