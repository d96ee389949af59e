//! Generate-all, filter, upload-all snapshot flow.

use futures::future::join_all;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SnapshotConfig;
use crate::media::TrackSummary;

use super::error::SnapshotError;
use super::extractor::FrameExtractor;
use super::host::ImageHost;

/// Options controlling snapshot generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    /// Number of snapshots to publish. One extra candidate is generated.
    pub count: usize,
    pub extension: String,
    /// Draw each timestamp randomly within its window.
    pub random: bool,
    pub max_upload_bytes: u64,
}

impl SnapshotOptions {
    pub fn from_config(config: &SnapshotConfig, random: bool) -> Self {
        Self {
            count: config.count,
            extension: config.extension.clone(),
            random,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// A hosted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub url: String,
}

/// Uploaded snapshots in timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotSet {
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotSet {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.snapshots.iter().map(|s| s.url.as_str()).collect()
    }
}

/// Candidate timestamps for `count` published snapshots.
///
/// Produces `count + 1` timestamps at `interval * i` for `i` in `1..=count+1`,
/// with `interval = duration / (count + 2)`. When `rng` is given each
/// timestamp is drawn from `[interval * i, interval * (i + 1))` instead.
pub fn candidate_timestamps<R: Rng>(
    duration_secs: f64,
    count: usize,
    mut rng: Option<&mut R>,
) -> Vec<f64> {
    let interval = duration_secs / (count + 2) as f64;
    (1..=count + 1)
        .map(|i| {
            let start = interval * i as f64;
            match rng.as_deref_mut() {
                Some(rng) if interval > 0.0 => rng.gen_range(start..start + interval),
                _ => start,
            }
        })
        .collect()
}

/// Path of the `n`th candidate (1-based) inside the job cache directory.
pub fn snapshot_path(cache_dir: &Path, n: usize, extension: &str) -> PathBuf {
    cache_dir.join(format!("snapshot_{}.{}", n, extension))
}

/// Drops the single smallest candidate, then everything above `max_bytes`
/// unless `authenticated`. Order is preserved.
pub fn select_candidates(
    candidates: Vec<(PathBuf, u64)>,
    max_bytes: u64,
    authenticated: bool,
) -> Vec<PathBuf> {
    let smallest = candidates
        .iter()
        .enumerate()
        .min_by_key(|(_, (_, size))| *size)
        .map(|(idx, _)| idx);

    candidates
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != smallest)
        .filter_map(|(_, (path, size))| {
            if !authenticated && size > max_bytes {
                warn!(
                    path = %path.display(),
                    size,
                    max_bytes,
                    "Skipping snapshot above the upload size limit"
                );
                None
            } else {
                Some(path)
            }
        })
        .collect()
}

/// Runs extraction and hosting for a release.
pub struct SnapshotPipeline {
    extractor: Arc<dyn FrameExtractor>,
    host: Arc<dyn ImageHost>,
    options: SnapshotOptions,
}

impl SnapshotPipeline {
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        host: Arc<dyn ImageHost>,
        options: SnapshotOptions,
    ) -> Self {
        Self {
            extractor,
            host,
            options,
        }
    }

    pub fn options(&self) -> &SnapshotOptions {
        &self.options
    }

    /// Generates every candidate, filters them and uploads the rest.
    ///
    /// Any generation failure fails the whole call. Upload failures only
    /// drop the affected image.
    pub async fn generate_and_upload(
        &self,
        input: &Path,
        tracks: &TrackSummary,
        cache_dir: &Path,
    ) -> Result<SnapshotSet, SnapshotError> {
        if self.options.count == 0 {
            return Ok(SnapshotSet::default());
        }

        let candidates = self.generate(input, tracks, cache_dir).await?;
        let accepted = select_candidates(
            candidates,
            self.options.max_upload_bytes,
            self.host.authenticated(),
        );
        Ok(self.upload(accepted).await)
    }

    /// Generates all candidates and returns them with their file sizes.
    pub async fn generate(
        &self,
        input: &Path,
        tracks: &TrackSummary,
        cache_dir: &Path,
    ) -> Result<Vec<(PathBuf, u64)>, SnapshotError> {
        let duration = tracks
            .duration_secs
            .filter(|d| *d > 0.0)
            .ok_or(SnapshotError::UnknownDuration)?;

        let timestamps = if self.options.random {
            candidate_timestamps(duration, self.options.count, Some(&mut rand::thread_rng()))
        } else {
            candidate_timestamps::<rand::rngs::ThreadRng>(duration, self.options.count, None)
        };

        tokio::fs::create_dir_all(cache_dir).await?;
        info!(
            candidates = timestamps.len(),
            extractor = self.extractor.name(),
            "Generating snapshots"
        );

        let tasks = timestamps.iter().enumerate().map(|(idx, ts)| {
            let output = snapshot_path(cache_dir, idx + 1, &self.options.extension);
            self.generate_one(input, *ts, output)
        });

        join_all(tasks).await.into_iter().collect()
    }

    async fn generate_one(
        &self,
        input: &Path,
        timestamp: f64,
        output: PathBuf,
    ) -> Result<(PathBuf, u64), SnapshotError> {
        if output.exists() {
            debug!(path = %output.display(), "Reusing existing snapshot");
        } else {
            self.extractor.extract(input, timestamp, &output).await?;
        }
        let size = tokio::fs::metadata(&output).await?.len();
        Ok((output, size))
    }

    async fn upload(&self, paths: Vec<PathBuf>) -> SnapshotSet {
        let uploads = paths.into_iter().map(|path| async move {
            match self.host.upload(&path).await {
                Ok(url) => Some(Snapshot { path, url }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Snapshot upload failed");
                    None
                }
            }
        });

        let snapshots: Vec<Snapshot> = join_all(uploads).await.into_iter().flatten().collect();
        info!(
            host = self.host.name(),
            uploaded = snapshots.len(),
            "Snapshots uploaded"
        );
        SnapshotSet { snapshots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockFrameExtractor, MockImageHost};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options(count: usize) -> SnapshotOptions {
        SnapshotOptions {
            count,
            extension: "png".to_string(),
            random: false,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }

    #[test]
    fn test_fixed_timestamps() {
        let ts = candidate_timestamps::<StdRng>(500.0, 3, None);
        assert_eq!(ts, vec![100.0, 200.0, 300.0, 400.0]);
    }

    #[test]
    fn test_random_timestamps_stay_in_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let ts = candidate_timestamps(500.0, 3, Some(&mut rng));
        assert_eq!(ts.len(), 4);
        for (i, t) in ts.iter().enumerate() {
            let start = 100.0 * (i + 1) as f64;
            assert!(*t >= start && *t < start + 100.0, "{} outside window", t);
        }
    }

    #[test]
    fn test_select_drops_smallest_and_oversized() {
        let candidates = vec![
            (PathBuf::from("1"), 300),
            (PathBuf::from("2"), 100),
            (PathBuf::from("3"), 9_000),
            (PathBuf::from("4"), 200),
        ];
        let selected = select_candidates(candidates.clone(), 1_000, false);
        assert_eq!(selected, vec![PathBuf::from("1"), PathBuf::from("4")]);

        let selected = select_candidates(candidates, 1_000, true);
        assert_eq!(
            selected,
            vec![PathBuf::from("1"), PathBuf::from("3"), PathBuf::from("4")]
        );
    }

    #[tokio::test]
    async fn test_count_three_generates_four_and_publishes_three() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(MockFrameExtractor::new());
        let host = Arc::new(MockImageHost::new());
        let pipeline = SnapshotPipeline::new(extractor.clone(), host.clone(), options(3));

        let tracks = fixtures::track_summary(1200.0);
        let set = pipeline
            .generate_and_upload(Path::new("/media/a.mkv"), &tracks, dir.path())
            .await
            .unwrap();

        assert_eq!(extractor.extract_count().await, 4);
        assert_eq!(set.len(), 3);
        // The mock writes larger files for later timestamps.
        let smallest = snapshot_path(dir.path(), 1, "png");
        assert!(set.snapshots.iter().all(|s| s.path != smallest));
        assert_eq!(host.uploaded().await.len(), 3);
    }

    #[tokio::test]
    async fn test_existing_candidates_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=4 {
            std::fs::write(snapshot_path(dir.path(), n, "png"), vec![0u8; n * 10]).unwrap();
        }
        let extractor = Arc::new(MockFrameExtractor::new());
        let host = Arc::new(MockImageHost::new());
        let pipeline = SnapshotPipeline::new(extractor.clone(), host, options(3));

        let set = pipeline
            .generate_and_upload(
                Path::new("/media/a.mkv"),
                &fixtures::track_summary(1200.0),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(extractor.extract_count().await, 0);
        assert_eq!(set.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_failure_omits_image() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(MockImageHost::new());
        host.fail_path(snapshot_path(dir.path(), 2, "png")).await;
        let pipeline =
            SnapshotPipeline::new(Arc::new(MockFrameExtractor::new()), host, options(3));

        let set = pipeline
            .generate_and_upload(
                Path::new("/media/a.mkv"),
                &fixtures::track_summary(1200.0),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(MockFrameExtractor::new());
        extractor
            .set_next_error(SnapshotError::extraction_failed(1.0, "bad frame", None))
            .await;
        let pipeline =
            SnapshotPipeline::new(extractor, Arc::new(MockImageHost::new()), options(3));

        let err = pipeline
            .generate_and_upload(
                Path::new("/media/a.mkv"),
                &fixtures::track_summary(1200.0),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::ExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn test_unknown_duration() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = SnapshotPipeline::new(
            Arc::new(MockFrameExtractor::new()),
            Arc::new(MockImageHost::new()),
            options(3),
        );
        let mut tracks = fixtures::track_summary(0.0);
        tracks.duration_secs = None;
        let err = pipeline
            .generate_and_upload(Path::new("/media/a.mkv"), &tracks, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownDuration));
    }
}
