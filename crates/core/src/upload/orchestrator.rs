//! Per-provider upload state machine.
//!
//! Each provider goes through session check, optional snapshot embedding,
//! submission with retries, notification, watch directory copy and the
//! optional post-upload edit. Providers are processed one after another and
//! a failed provider never stops the next one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::media::TrackSummary;
use crate::notify::Notifier;
use crate::retry::RetryPolicy;
use crate::snapshot::{render_gallery, SnapshotPipeline, SnapshotSet};

use super::client::ProviderApi;
use super::error::ProviderError;
use super::types::{Provider, TorrentPayload, UploadForm, UploadResult};

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

type CachedSnapshots = Result<SnapshotSet, String>;

/// Terminal state of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Succeeded {
        provider: String,
        result: UploadResult,
        /// Snapshots were attached through the edit form.
        edited: bool,
    },
    Failed {
        provider: String,
        error: String,
    },
}

impl ProviderOutcome {
    pub fn provider(&self) -> &str {
        match self {
            Self::Succeeded { provider, .. } | Self::Failed { provider, .. } => provider,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Snapshot inputs for a release.
pub struct SnapshotSource<'a> {
    pub pipeline: &'a SnapshotPipeline,
    pub input: &'a Path,
    pub tracks: &'a TrackSummary,
    pub cache_dir: &'a Path,
}

/// A packaged release ready for submission.
pub struct ReleaseUpload<'a> {
    pub torrent: TorrentPayload,
    /// Path of the artifact, copied into the watch directory after upload.
    pub torrent_path: &'a Path,
    /// Form shared by every provider; the description is cloned per provider.
    pub form: UploadForm,
    pub snapshots: Option<SnapshotSource<'a>>,
}

/// Drives uploads across providers.
pub struct UploadOrchestrator {
    api: Arc<dyn ProviderApi>,
    notifier: Option<Arc<dyn Notifier>>,
    submit_policy: RetryPolicy,
    edit_policy: RetryPolicy,
    watch_dir: Option<PathBuf>,
}

impl UploadOrchestrator {
    pub fn new(api: Arc<dyn ProviderApi>, submit_policy: RetryPolicy, edit_policy: RetryPolicy) -> Self {
        Self {
            api,
            notifier: None,
            submit_policy,
            edit_policy,
            watch_dir: None,
        }
    }

    /// Notify after each successful, non-hidden upload.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_watch_dir(mut self, watch_dir: impl Into<PathBuf>) -> Self {
        self.watch_dir = Some(watch_dir.into());
        self
    }

    /// Uploads to every provider in order.
    ///
    /// Every failure, including snapshot generation ahead of submission, ends
    /// up as [`ProviderOutcome::Failed`] for that provider only.
    pub async fn run(
        &self,
        providers: &[Provider],
        release: &ReleaseUpload<'_>,
    ) -> Vec<ProviderOutcome> {
        let mut snapshots = None;
        let mut outcomes = Vec::with_capacity(providers.len());

        for provider in providers {
            let outcome = self.process(provider, release, &mut snapshots).await;
            match &outcome {
                ProviderOutcome::Succeeded { result, .. } => {
                    info!(provider = %provider.name, url = %result.url, "Upload succeeded")
                }
                ProviderOutcome::Failed { error, .. } => {
                    warn!(provider = %provider.name, error = %error, "Upload failed")
                }
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn process(
        &self,
        provider: &Provider,
        release: &ReleaseUpload<'_>,
        snapshots: &mut Option<CachedSnapshots>,
    ) -> ProviderOutcome {
        let failed = |error: String| ProviderOutcome::Failed {
            provider: provider.name.clone(),
            error,
        };

        let session_valid = self.check_session(provider).await;
        let mut form = release.form.clone();

        if let Some(source) = &release.snapshots {
            if !session_valid {
                match Self::snapshot_set(source, snapshots).await {
                    Ok(set) => append_gallery(&mut form.description, set),
                    Err(e) => return failed(format!("snapshot generation failed: {}", e)),
                }
            }
        }

        let result = match self.submit(provider, &release.torrent, &form).await {
            Ok(result) => result,
            Err(e) => return failed(e.to_string()),
        };

        if !form.flags.hidden {
            self.notify(provider, &result).await;
        }
        self.copy_to_watch_dir(release.torrent_path).await;

        let mut edited = false;
        if let (true, Some(source)) = (session_valid, &release.snapshots) {
            match Self::snapshot_set(source, snapshots).await {
                Ok(set) if !set.is_empty() => {
                    append_gallery(&mut form.description, set);
                    edited = self.edit(provider, result.id, &form).await;
                }
                Ok(_) => debug!(provider = %provider.name, "No snapshots to attach"),
                Err(e) => warn!(provider = %provider.name, error = %e, "Snapshot generation failed"),
            }
        }

        ProviderOutcome::Succeeded {
            provider: provider.name.clone(),
            result,
            edited,
        }
    }

    async fn check_session(&self, provider: &Provider) -> bool {
        if !provider.has_session() {
            return false;
        }
        match self.api.check_session(provider).await {
            Ok(valid) => {
                debug!(provider = %provider.name, valid, "Session checked");
                valid
            }
            Err(e) => {
                warn!(provider = %provider.name, error = %e, "Failed to verify cookies");
                false
            }
        }
    }

    // Snapshots are generated and uploaded once per release, then shared.
    // A failure is kept too so later providers do not regenerate.
    async fn snapshot_set<'s>(
        source: &SnapshotSource<'_>,
        cached: &'s mut Option<CachedSnapshots>,
    ) -> Result<&'s SnapshotSet, &'s str> {
        if cached.is_none() {
            let generated = source
                .pipeline
                .generate_and_upload(source.input, source.tracks, source.cache_dir)
                .await
                .map_err(|e| e.to_string());
            *cached = Some(generated);
        }
        match cached {
            Some(Ok(set)) => Ok(set),
            Some(Err(e)) => Err(e.as_str()),
            None => Err("snapshots unavailable"),
        }
    }

    async fn submit(
        &self,
        provider: &Provider,
        torrent: &TorrentPayload,
        form: &UploadForm,
    ) -> Result<UploadResult, ProviderError> {
        info!(provider = %provider.name, name = %form.display_name, "Uploading");
        self.submit_policy
            .run(
                "submit",
                |_| self.api.submit(provider, torrent, form),
                ProviderError::is_retryable,
            )
            .await
    }

    async fn edit(&self, provider: &Provider, id: u64, form: &UploadForm) -> bool {
        let attempt = |_: u32| async move {
            match self.api.edit(provider, id, form).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ProviderError::Rejected("edit form not accepted".to_string())),
                Err(e) => Err(e),
            }
        };

        match self.edit_policy.run("edit", attempt, |_| true).await {
            Ok(()) => {
                info!(provider = %provider.name, id, "Snapshots attached");
                true
            }
            Err(e) => {
                warn!(
                    provider = %provider.name,
                    id,
                    error = %e,
                    "Failed to add images to torrent after retries"
                );
                false
            }
        }
    }

    async fn notify(&self, provider: &Provider, result: &UploadResult) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(&provider.name, result).await {
                warn!(provider = %provider.name, notifier = notifier.name(), error = %e, "Notification failed");
            }
        }
    }

    async fn copy_to_watch_dir(&self, torrent_path: &Path) {
        let Some(watch_dir) = &self.watch_dir else {
            return;
        };
        let Some(file_name) = torrent_path.file_name() else {
            return;
        };
        let target = watch_dir.join(file_name);
        match tokio::fs::copy(torrent_path, &target).await {
            Ok(_) => info!(path = %target.display(), "Copied torrent to watch directory"),
            Err(e) => warn!(
                watch_dir = %watch_dir.display(),
                error = %e,
                "Failed to copy to watch directory"
            ),
        }
    }
}

fn append_gallery(description: &mut String, set: &SnapshotSet) {
    if set.is_empty() {
        return;
    }
    description.push_str(SECTION_SEPARATOR);
    description.push_str(&render_gallery(&set.urls()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::config::{Credentials, SessionCookies};
    use crate::snapshot::SnapshotOptions;
    use crate::testing::{fixtures, MockFrameExtractor, MockImageHost, MockNotifier, MockProviderApi};
    use crate::upload::ReleaseFlags;
    use std::time::Duration;

    fn provider(name: &str, with_cookies: bool) -> Provider {
        Provider {
            name: name.to_string(),
            domain: format!("https://{}.example", name),
            proxy: None,
            credentials: Credentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            },
            announces: vec![],
            cookies: with_cookies.then(|| {
                [("session".to_string(), "abc".to_string())]
                    .into_iter()
                    .collect::<SessionCookies>()
            }),
        }
    }

    fn form(hidden: bool) -> UploadForm {
        UploadForm {
            display_name: "Show S01E01".to_string(),
            category: Category::AnimeEnglish,
            information: String::new(),
            description: "`Tech Specs:`".to_string(),
            flags: ReleaseFlags {
                hidden,
                ..Default::default()
            },
        }
    }

    fn release<'a>(path: &'a Path, hidden: bool, snapshots: Option<SnapshotSource<'a>>) -> ReleaseUpload<'a> {
        ReleaseUpload {
            torrent: TorrentPayload {
                file_name: "Show.S01E01.torrent".to_string(),
                bytes: b"d4:infode".to_vec(),
            },
            torrent_path: path,
            form: form(hidden),
            snapshots,
        }
    }

    fn orchestrator(api: Arc<MockProviderApi>) -> UploadOrchestrator {
        UploadOrchestrator::new(
            api,
            RetryPolicy::exponential(3, Duration::from_millis(1)),
            RetryPolicy::fixed(5, Duration::from_millis(1)),
        )
    }

    fn snapshot_pipeline() -> SnapshotPipeline {
        SnapshotPipeline::new(
            Arc::new(MockFrameExtractor::new()),
            Arc::new(MockImageHost::new()),
            SnapshotOptions {
                count: 3,
                extension: "png".to_string(),
                random: false,
                max_upload_bytes: 5 * 1024 * 1024,
            },
        )
    }

    #[tokio::test]
    async fn test_failed_provider_does_not_block_next() {
        let api = Arc::new(MockProviderApi::new());
        api.fail_submissions_for("first", "banned").await;

        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("Show.S01E01.torrent");
        std::fs::write(&torrent, b"d4:infode").unwrap();

        let outcomes = orchestrator(api.clone())
            .run(
                &[provider("first", false), provider("second", false)],
                &release(&torrent, false, None),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert!(outcomes[1].is_success());
        // Three attempts for the failing provider, one for the next.
        assert_eq!(api.submissions().await.len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let api = Arc::new(MockProviderApi::new());
        api.push_submit_error(ProviderError::MalformedResponse("<html>".into()))
            .await;

        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();

        let outcomes = orchestrator(api.clone())
            .run(&[provider("nyaa", false)], &release(&torrent, false, None))
            .await;
        assert!(!outcomes[0].is_success());
        assert_eq!(api.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshots_embedded_without_session() {
        let api = Arc::new(MockProviderApi::new());
        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();
        let pipeline = snapshot_pipeline();
        let tracks = fixtures::track_summary(1200.0);

        let source = SnapshotSource {
            pipeline: &pipeline,
            input: Path::new("/media/a.mkv"),
            tracks: &tracks,
            cache_dir: dir.path(),
        };
        let outcomes = orchestrator(api.clone())
            .run(&[provider("nyaa", false)], &release(&torrent, false, Some(source)))
            .await;

        assert!(matches!(outcomes[0], ProviderOutcome::Succeeded { edited: false, .. }));
        let submissions = api.submissions().await;
        assert!(submissions[0].form.description.contains("\n\n---\n\n![]("));
        assert!(api.edits().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshots_attached_by_edit_with_session() {
        let api = Arc::new(MockProviderApi::new());
        api.set_session_valid(true).await;
        api.set_edit_failures(2).await;

        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();
        let pipeline = snapshot_pipeline();
        let tracks = fixtures::track_summary(1200.0);

        let source = SnapshotSource {
            pipeline: &pipeline,
            input: Path::new("/media/a.mkv"),
            tracks: &tracks,
            cache_dir: dir.path(),
        };
        let outcomes = orchestrator(api.clone())
            .run(&[provider("nyaa", true)], &release(&torrent, false, Some(source)))
            .await;

        assert!(matches!(outcomes[0], ProviderOutcome::Succeeded { edited: true, .. }));
        let submissions = api.submissions().await;
        assert!(!submissions[0].form.description.contains("![]("));
        let edits = api.edits().await;
        assert_eq!(edits.len(), 3);
        assert!(edits[2].form.description.contains("![]("));
    }

    #[tokio::test]
    async fn test_edit_exhaustion_is_not_fatal() {
        let api = Arc::new(MockProviderApi::new());
        api.set_session_valid(true).await;
        api.set_edit_failures(10).await;

        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();
        let pipeline = snapshot_pipeline();
        let tracks = fixtures::track_summary(1200.0);

        let source = SnapshotSource {
            pipeline: &pipeline,
            input: Path::new("/media/a.mkv"),
            tracks: &tracks,
            cache_dir: dir.path(),
        };
        let outcomes = orchestrator(api.clone())
            .run(&[provider("nyaa", true)], &release(&torrent, false, Some(source)))
            .await;

        assert!(matches!(outcomes[0], ProviderOutcome::Succeeded { edited: false, .. }));
        assert_eq!(api.edits().await.len(), 5);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_earlier_outcomes() {
        let api = Arc::new(MockProviderApi::new());
        api.set_session_valid(true).await;
        let extractor = Arc::new(MockFrameExtractor::new());
        extractor.set_failing(true).await;
        let pipeline = SnapshotPipeline::new(
            extractor.clone(),
            Arc::new(MockImageHost::new()),
            SnapshotOptions {
                count: 3,
                extension: "png".to_string(),
                random: false,
                max_upload_bytes: 5 * 1024 * 1024,
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();
        let tracks = fixtures::track_summary(1200.0);
        let source = SnapshotSource {
            pipeline: &pipeline,
            input: Path::new("/media/a.mkv"),
            tracks: &tracks,
            cache_dir: dir.path(),
        };

        // "first" edits after upload, "second" needs the gallery before it.
        let outcomes = orchestrator(api.clone())
            .run(
                &[provider("first", true), provider("second", false)],
                &release(&torrent, false, Some(source)),
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            ProviderOutcome::Succeeded { provider, edited: false, .. } if provider == "first"
        ));
        match &outcomes[1] {
            ProviderOutcome::Failed { provider, error } => {
                assert_eq!(provider, "second");
                assert!(error.contains("decoder error"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let submissions = api.submissions().await;
        assert_eq!(submissions.len(), 1);
        assert!(api.edits().await.is_empty());

        // The failure is cached, so the second provider does not regenerate.
        let extracted = extractor.extract_count().await;
        assert!(extracted > 0);
        assert!(extracted <= 4);
    }

    #[tokio::test]
    async fn test_notification_skipped_when_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();

        let notifier = Arc::new(MockNotifier::new());
        let orch = orchestrator(Arc::new(MockProviderApi::new())).with_notifier(notifier.clone());

        orch.run(&[provider("nyaa", false)], &release(&torrent, true, None))
            .await;
        assert!(notifier.sent().await.is_empty());

        orch.run(&[provider("nyaa", false)], &release(&torrent, false, None))
            .await;
        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("a.torrent");
        std::fs::write(&torrent, b"x").unwrap();

        let notifier = Arc::new(MockNotifier::new());
        notifier.set_failing(true).await;
        let outcomes = orchestrator(Arc::new(MockProviderApi::new()))
            .with_notifier(notifier)
            .run(&[provider("nyaa", false)], &release(&torrent, false, None))
            .await;
        assert!(outcomes[0].is_success());
    }

    #[tokio::test]
    async fn test_watch_dir_copy() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("Show.S01E01.torrent");
        std::fs::write(&torrent, b"d4:infode").unwrap();
        let watch = dir.path().join("watch");
        std::fs::create_dir(&watch).unwrap();

        orchestrator(Arc::new(MockProviderApi::new()))
            .with_watch_dir(&watch)
            .run(&[provider("nyaa", false)], &release(&torrent, false, None))
            .await;
        assert!(watch.join("Show.S01E01.torrent").exists());
    }

    #[tokio::test]
    async fn test_missing_watch_dir_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let torrent = dir.path().join("Show.S01E01.torrent");
        std::fs::write(&torrent, b"d4:infode").unwrap();

        let outcomes = orchestrator(Arc::new(MockProviderApi::new()))
            .with_watch_dir(dir.path().join("missing"))
            .run(&[provider("nyaa", false)], &release(&torrent, false, None))
            .await;
        assert!(outcomes[0].is_success());
    }
}
