//! Error types for the snapshot module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating or hosting snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The media duration is unknown, so timestamps cannot be placed.
    #[error("Media duration is unknown")]
    UnknownDuration,

    /// Frame extraction failed.
    #[error("Frame extraction at {timestamp:.1}s failed: {reason}")]
    ExtractionFailed {
        timestamp: f64,
        reason: String,
        stderr: Option<String>,
    },

    /// Image decoding or encoding failed.
    #[error("Image processing failed for {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    /// The image host rejected or failed an upload.
    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    /// A generation task panicked or was cancelled.
    #[error("Snapshot task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Creates a new extraction failed error.
    pub fn extraction_failed(
        timestamp: f64,
        reason: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::ExtractionFailed {
            timestamp,
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new image processing error.
    pub fn image(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Image {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for SnapshotError {
    fn from(e: reqwest::Error) -> Self {
        Self::UploadFailed(e.to_string())
    }
}
