//! Error types for the torrent module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging a torrent.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Content path does not exist.
    #[error("Content not found: {path}")]
    ContentNotFound { path: PathBuf },

    /// Every file was excluded, or the directory is empty.
    #[error("No files to package in {path}")]
    EmptyPayload { path: PathBuf },

    /// mkbrr binary not found.
    #[error("mkbrr not found at path: {path}")]
    MkbrrNotFound { path: PathBuf },

    /// The packaging backend failed.
    #[error("Torrent generation failed: {reason}")]
    GenerationFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The backend finished but the artifact is missing or unreadable.
    #[error("Invalid torrent artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    /// Public tracker list could not be fetched.
    #[error("Failed to fetch public trackers: {0}")]
    TrackerFetch(String),

    /// I/O error during packaging.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TorrentError {
    /// Creates a new generation failed error with stderr output.
    pub fn generation_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new invalid artifact error.
    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
