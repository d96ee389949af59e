//! Mock frame extractor for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::snapshot::{FrameExtractor, SnapshotError};

/// Mock implementation of the FrameExtractor trait.
///
/// Writes `timestamp + 1` bytes per frame so that later frames are larger,
/// which makes the smallest-candidate drop predictable.
#[derive(Debug, Clone, Default)]
pub struct MockFrameExtractor {
    timestamps: Arc<RwLock<Vec<f64>>>,
    next_error: Arc<RwLock<Option<SnapshotError>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next extraction with `error`.
    pub async fn set_next_error(&self, error: SnapshotError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every extraction while set.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn extract_count(&self) -> usize {
        self.timestamps.read().await.len()
    }

    /// Timestamps requested so far.
    pub async fn timestamps(&self) -> Vec<f64> {
        self.timestamps.read().await.clone()
    }
}

#[async_trait]
impl FrameExtractor for MockFrameExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        _input: &Path,
        timestamp: f64,
        output: &Path,
    ) -> Result<(), SnapshotError> {
        self.timestamps.write().await.push(timestamp);

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if *self.failing.read().await {
            return Err(SnapshotError::extraction_failed(timestamp, "decoder error", None));
        }

        tokio::fs::write(output, vec![0u8; timestamp as usize + 1]).await?;
        Ok(())
    }
}
