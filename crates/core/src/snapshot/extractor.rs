//! Frame extraction through ffmpeg.

use async_trait::async_trait;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use super::error::SnapshotError;

/// Writes a still frame of a video to an image file.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Extracts the frame at `timestamp` seconds into `output`.
    async fn extract(
        &self,
        input: &Path,
        timestamp: f64,
        output: &Path,
    ) -> Result<(), SnapshotError>;
}

/// ffmpeg-based extractor. Frames are normalized to 8-bit depth, and PNG
/// output is re-encoded at maximum compression.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg_path: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Builds ffmpeg arguments for a single-frame grab.
    pub fn build_args(input: &Path, timestamp: f64, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", timestamp),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            // Square pixels for anamorphic sources
            "-vf".to_string(),
            "scale='max(sar,1)*iw':'max(1/sar,1)*ih'".to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn extract(
        &self,
        input: &Path,
        timestamp: f64,
        output: &Path,
    ) -> Result<(), SnapshotError> {
        let args = Self::build_args(input, timestamp, output);
        debug!(timestamp, output = %output.display(), "Extracting frame");

        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SnapshotError::FfmpegNotFound {
                        path: self.ffmpeg_path.clone(),
                    }
                } else {
                    SnapshotError::Io(e)
                }
            })?;

        if !result.status.success() {
            return Err(SnapshotError::extraction_failed(
                timestamp,
                format!("ffmpeg exited with {}", result.status),
                Some(String::from_utf8_lossy(&result.stderr).into_owned()),
            ));
        }

        let path = output.to_path_buf();
        tokio::task::spawn_blocking(move || normalize_image(&path))
            .await
            .map_err(|e| SnapshotError::Task(e.to_string()))?
    }
}

/// Rewrite an image with 8 bits per channel; PNG files get the best compression.
pub fn normalize_image(path: &Path) -> Result<(), SnapshotError> {
    let img = image::open(path).map_err(|e| SnapshotError::image(path, e))?;

    let img = match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let is_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

    if is_png {
        let writer = BufWriter::new(File::create(path)?);
        let encoder =
            PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder)
            .map_err(|e| SnapshotError::image(path, e))?;
    } else {
        img.save(path).map_err(|e| SnapshotError::image(path, e))?;
    }

    Ok(())
}
