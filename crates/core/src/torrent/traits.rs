//! Trait definitions for the torrent module.

use async_trait::async_trait;

use super::error::TorrentError;
use super::types::{ProgressCallback, TorrentRequest};

/// A backend that writes a `.torrent` for a file or directory.
#[async_trait]
pub trait TorrentBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Writes the torrent described by `request` to `request.output_path`.
    ///
    /// Backends that hash in-process report per-piece progress through
    /// `progress`; others may ignore it.
    async fn create(
        &self,
        request: &TorrentRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<(), TorrentError>;
}
