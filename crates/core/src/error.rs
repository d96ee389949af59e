//! Job-level errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::media::MediaError;
use crate::torrent::TorrentError;

/// A condition that aborts a release job.
///
/// Provider failures are not job errors; they are reported per provider
/// in the job report.
#[derive(Debug, Error)]
pub enum JobError {
    /// Input path does not exist.
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// A directory input without any `.mkv` or `.mp4` file.
    #[error("No .mkv or .mp4 file in {path}")]
    NoMediaFile { path: PathBuf },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Torrent(#[from] TorrentError),

    /// I/O error while resolving the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Stage that failed, for the final report.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InputNotFound { .. } | Self::NoMediaFile { .. } | Self::Io(_) => "input",
            Self::Media(_) => "media",
            Self::Torrent(_) => "packaging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = JobError::NoMediaFile {
            path: PathBuf::from("/media/Show"),
        };
        assert_eq!(err.category(), "input");
        assert_eq!(JobError::from(MediaError::NoAudioTracks).category(), "media");
        assert_eq!(
            JobError::from(TorrentError::generation_failed("exit 1", None)).category(),
            "packaging"
        );
    }

    #[test]
    fn test_media_message_is_passed_through() {
        let err = JobError::from(MediaError::VideoTrackCount { count: 2 });
        assert_eq!(err.to_string(), "Expected exactly one video track, found 2");
    }
}
