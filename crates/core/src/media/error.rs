//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing and describing a media file.
#[derive(Debug, Error)]
pub enum MediaError {
    /// mediainfo binary not found.
    #[error("mediainfo not found at path: {path}")]
    ProbeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The probe process failed.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse probe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// A release must contain exactly one video track.
    #[error("Expected exactly one video track, found {count}")]
    VideoTrackCount { count: usize },

    /// A release must contain at least one audio track.
    #[error("No audio tracks found")]
    NoAudioTracks,

    /// I/O error while probing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new parse error.
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }

    /// Whether this error comes from track validation rather than the probe itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::VideoTrackCount { .. } | Self::NoAudioTracks)
    }
}
