//! Media probing through the `mediainfo` CLI.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use super::describe::describe_tracks;
use super::error::MediaError;
use super::types::{MediaReport, MiOutput, ProbeFidelity, TrackSummary};

/// A tool that reports the tracks of a media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Returns the name of this probe implementation.
    fn name(&self) -> &str;

    /// Probes a media file at the given fidelity.
    async fn probe(&self, path: &Path, fidelity: ProbeFidelity)
        -> Result<MediaReport, MediaError>;

    /// Returns the plain-text report of a media file.
    async fn text_report(&self, path: &Path) -> Result<String, MediaError>;
}

/// Probe a file, re-probing at full fidelity when the fast pass is incomplete.
pub async fn probe_media(probe: &dyn MediaProbe, path: &Path) -> Result<MediaReport, MediaError> {
    let report = probe.probe(path, ProbeFidelity::Fast).await?;
    if !report.is_incomplete() {
        return Ok(report);
    }

    debug!(
        path = %path.display(),
        "Fast probe missing duration or bitrate, re-probing at full fidelity"
    );
    probe.probe(path, ProbeFidelity::Full).await
}

/// Probe a file and describe its tracks.
pub async fn inspect_media(
    probe: &dyn MediaProbe,
    path: &Path,
) -> Result<TrackSummary, MediaError> {
    let report = probe_media(probe, path).await?;
    let summary = describe_tracks(&report)?;
    info!(
        path = %path.display(),
        audio = summary.audio.len(),
        subtitles = summary.subtitles.len(),
        distinct_audio = summary.distinct_audio_languages,
        "Media probed"
    );
    Ok(summary)
}

/// `mediainfo` CLI probe.
#[derive(Debug, Clone)]
pub struct MediaInfoCli {
    mediainfo_path: PathBuf,
}

impl MediaInfoCli {
    /// Creates a probe using the given mediainfo binary.
    pub fn new(mediainfo_path: impl Into<PathBuf>) -> Self {
        Self {
            mediainfo_path: mediainfo_path.into(),
        }
    }

    async fn run(&self, path: &Path, args: &[String]) -> Result<String, MediaError> {
        if !path.exists() {
            return Err(MediaError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.mediainfo_path)
            .args(args)
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::ProbeNotFound {
                        path: self.mediainfo_path.clone(),
                    }
                } else {
                    MediaError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(MediaError::probe_failed(format!(
                "mediainfo failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parses `mediainfo --Output=JSON` output.
    pub fn parse_json(json: &str) -> Result<MediaReport, MediaError> {
        let output: MiOutput = serde_json::from_str(json)
            .map_err(|e| MediaError::parse_error(format!("mediainfo JSON: {}", e)))?;
        let tracks = output.media.map(|m| m.track).unwrap_or_default();
        Ok(MediaReport::new(tracks))
    }
}

#[async_trait]
impl MediaProbe for MediaInfoCli {
    fn name(&self) -> &str {
        "mediainfo"
    }

    async fn probe(
        &self,
        path: &Path,
        fidelity: ProbeFidelity,
    ) -> Result<MediaReport, MediaError> {
        let args = vec![
            "--Output=JSON".to_string(),
            "--Full".to_string(),
            format!("--ParseSpeed={}", fidelity.parse_speed()),
        ];
        let stdout = self.run(path, &args).await?;
        Self::parse_json(&stdout)
    }

    async fn text_report(&self, path: &Path) -> Result<String, MediaError> {
        let report = self.run(path, &[]).await?;
        // The report embeds the absolute path; publish only the file name.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(report.replace(&path.display().to_string(), &file_name))
    }
}
