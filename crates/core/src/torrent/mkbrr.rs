//! External packaging through `mkbrr create`.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::error::TorrentError;
use super::traits::TorrentBackend;
use super::types::{ProgressCallback, TorrentRequest, EXCLUDED_EXTENSIONS};

/// mkbrr subprocess backend.
#[derive(Debug, Clone)]
pub struct MkbrrBackend {
    mkbrr_path: PathBuf,
}

impl MkbrrBackend {
    pub fn new(mkbrr_path: impl Into<PathBuf>) -> Self {
        Self {
            mkbrr_path: mkbrr_path.into(),
        }
    }

    /// Builds mkbrr arguments equivalent to the builtin backend's output.
    pub fn build_args(request: &TorrentRequest) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            request.content_path.to_string_lossy().to_string(),
            "--output".to_string(),
            request.output_path.to_string_lossy().to_string(),
        ];

        for tracker in &request.announces {
            args.extend(["--tracker".to_string(), tracker.clone()]);
        }

        if let Some(source) = &request.source {
            args.extend(["--source".to_string(), source.clone()]);
        }

        // mkbrr takes the piece length as a power of two exponent
        if let Some(length) = request.piece_length {
            args.extend([
                "--piece-length".to_string(),
                length.trailing_zeros().to_string(),
            ]);
        }

        let exclude = EXCLUDED_EXTENSIONS
            .iter()
            .map(|ext| format!("*.{}", ext))
            .collect::<Vec<_>>()
            .join(",");
        args.extend(["--exclude".to_string(), exclude]);

        args.extend(["--no-date".to_string(), "--no-creator".to_string()]);

        args
    }
}

#[async_trait]
impl TorrentBackend for MkbrrBackend {
    fn name(&self) -> &str {
        "mkbrr"
    }

    async fn create(
        &self,
        request: &TorrentRequest,
        _progress: Option<ProgressCallback>,
    ) -> Result<(), TorrentError> {
        if !request.content_path.exists() {
            return Err(TorrentError::ContentNotFound {
                path: request.content_path.clone(),
            });
        }

        let args = Self::build_args(request);
        debug!(args = ?args, "Running mkbrr");

        let output = Command::new(&self.mkbrr_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TorrentError::MkbrrNotFound {
                        path: self.mkbrr_path.clone(),
                    }
                } else {
                    TorrentError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TorrentError::generation_failed(
                format!("mkbrr exited with {}", output.status),
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            ));
        }

        if !request.output_path.exists() {
            return Err(TorrentError::invalid_artifact(
                &request.output_path,
                "mkbrr did not write the torrent",
            ));
        }

        Ok(())
    }
}
