//! Release job integration tests.
//!
//! These tests run the job runner end to end with mock tools and services:
//! - Display name tags and metadata enrichment
//! - Description assembly (media report link, snapshot gallery)
//! - Torrent reuse across runs
//! - Provider isolation and fatal media errors

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use seedpost_core::{
    config::TorrentConfig,
    media::MediaReport,
    testing::{
        fixtures, MockFrameExtractor, MockImageHost, MockMediaProbe, MockMetadataResolver,
        MockPasteService, MockProviderApi, MockTorrentBackend,
    },
    Category, JobError, JobOptions, JobRunner, ProviderOutcome, RetryPolicy, SnapshotOptions,
    SnapshotPipeline, TagOptions, TorrentPackager, UploadOrchestrator,
};

/// Test helper wiring a job runner to mocks.
struct TestHarness {
    probe: MockMediaProbe,
    backend: MockTorrentBackend,
    api: MockProviderApi,
    extractor: MockFrameExtractor,
    paste: MockPasteService,
    resolver: MockMetadataResolver,
    cache_dir: TempDir,
    media_dir: TempDir,
}

impl TestHarness {
    fn new(report: MediaReport) -> Self {
        Self {
            probe: MockMediaProbe::new(report),
            backend: MockTorrentBackend::new(),
            api: MockProviderApi::new(),
            extractor: MockFrameExtractor::new(),
            paste: MockPasteService::new(),
            resolver: MockMetadataResolver::new(Some(fixtures::anime_entry())),
            cache_dir: TempDir::new().expect("Failed to create cache dir"),
            media_dir: TempDir::new().expect("Failed to create media dir"),
        }
    }

    /// Runner with two providers and every optional service attached.
    fn runner(&self, snapshot_count: usize) -> JobRunner {
        let packager = TorrentPackager::new(
            Arc::new(self.backend.clone()),
            &TorrentConfig::default(),
        )
        .expect("Failed to create packager");

        let orchestrator = UploadOrchestrator::new(
            Arc::new(self.api.clone()),
            RetryPolicy::exponential(3, Duration::from_millis(1)),
            RetryPolicy::fixed(5, Duration::from_millis(1)),
        );

        let pipeline = SnapshotPipeline::new(
            Arc::new(self.extractor.clone()),
            Arc::new(MockImageHost::new()),
            SnapshotOptions {
                count: snapshot_count,
                extension: "png".to_string(),
                random: false,
                max_upload_bytes: 5 * 1024 * 1024,
            },
        );

        JobRunner::new(
            Arc::new(self.probe.clone()),
            packager,
            orchestrator,
            vec![fixtures::provider("nyaa"), fixtures::provider("mirror")],
            self.cache_dir.path(),
        )
        .with_snapshots(pipeline)
        .with_paste(Arc::new(self.paste.clone()))
        .with_resolver(
            Arc::new(self.resolver.clone()),
            RetryPolicy::exponential(3, Duration::from_millis(1)),
        )
    }

    fn media_file(&self, name: &str) -> PathBuf {
        let path = self.media_dir.path().join(name);
        std::fs::write(&path, b"matroska").expect("Failed to write media file");
        path
    }
}

fn options(category: Category) -> JobOptions {
    JobOptions {
        category,
        tags: TagOptions::default(),
        flags: Default::default(),
        note: None,
        advert: None,
        info: None,
        metadata: false,
        metadata_link: None,
        media_report: true,
        edit_code: None,
        real_length: false,
        overwrite: false,
        skip_upload: false,
    }
}

#[tokio::test]
async fn test_dual_audio_release_end_to_end() {
    let harness = TestHarness::new(fixtures::media_report(&["en", "ja"], &["en"]));
    let input = harness.media_file("Show.S01E01.mkv");
    let category: Category = "1".parse().unwrap();

    let report = tokio_test::assert_ok!(harness.runner(3).run(&input, &options(category)).await);

    assert_eq!(report.name, "Show.S01E01");
    assert!(report.display_name.ends_with("(Dual-Audio)"));
    assert_eq!(report.display_name, "Show S01E01 (Dual-Audio)");
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 2);
    assert!(report
        .torrent
        .path
        .ends_with("Show.S01E01_files/Show.S01E01.torrent"));

    let submissions = harness.api.submissions().await;
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].provider, "nyaa");
    assert_eq!(submissions[1].provider, "mirror");
    assert_eq!(submissions[0].torrent_file_name, "Show.S01E01.torrent");

    let description = &submissions[0].form.description;
    assert!(description.starts_with("`Tech Specs:`"));
    assert!(description.contains("[Full MediaInfo](https://paste.test/1)"));
    assert!(description.contains("\n\n---\n\n![](https://img.test/snapshot_"));
    // Snapshots are generated once and shared by both providers.
    assert_eq!(harness.extractor.extract_count().await, 4);
    assert_eq!(submissions[1].form.description, *description);
}

#[tokio::test]
async fn test_announces_are_the_union_of_providers() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    let input = harness.media_file("Movie.2019.1080p.mkv");

    harness
        .runner(0)
        .run(&input, &options(Category::LiveActionEnglish))
        .await
        .unwrap();

    let requests = harness.backend.requests().await;
    assert_eq!(
        requests[0].announces,
        vec![
            "http://nyaa.example/announce",
            "http://mirror.example/announce"
        ]
    );
}

#[tokio::test]
async fn test_repeated_language_counts_once() {
    let harness = TestHarness::new(fixtures::media_report(&["en", "en", "ja"], &["en", "fr"]));
    let input = harness.media_file("Show.S01E02.mkv");
    let runner = harness.runner(0);

    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;
    let report = runner.run(&input, &opts).await.unwrap();
    assert_eq!(report.display_name, "Show S01E02 (Dual-Audio, Multi-Subs)");
    assert!(report.description.contains("`Audios (2):`"));

    opts.real_length = true;
    let report = runner.run(&input, &opts).await.unwrap();
    assert_eq!(report.display_name, "Show S01E02 (Multi-Audio, Multi-Subs)");
    assert!(report.description.contains("`Audios (3):`"));
}

#[tokio::test]
async fn test_metadata_title_and_information() {
    let harness = TestHarness::new(fixtures::media_report(&["ja"], &["en"]));
    let input = harness.media_file("Frieren.S01E01.1080p.mkv");

    let mut opts = options(Category::AnimeEnglish);
    opts.metadata = true;
    let report = harness.runner(0).run(&input, &opts).await.unwrap();

    assert_eq!(
        report.display_name,
        "Frieren S01E01 1080p (Sousou no Frieren)"
    );
    assert_eq!(report.information, "https://myanimelist.net/anime/52991/");

    let submissions = harness.api.submissions().await;
    assert_eq!(
        submissions[0].form.information,
        "https://myanimelist.net/anime/52991/"
    );
}

#[tokio::test]
async fn test_metadata_skipped_for_live_action() {
    let harness = TestHarness::new(fixtures::media_report(&["ja"], &["en"]));
    let input = harness.media_file("Drama.S01E01.mkv");

    let mut opts = options(Category::LiveActionRaw);
    opts.metadata = true;
    opts.skip_upload = true;
    let report = harness.runner(0).run(&input, &opts).await.unwrap();

    assert_eq!(harness.resolver.call_count().await, 0);
    assert_eq!(report.display_name, "Drama S01E01");
    assert!(report.information.is_empty());
}

#[tokio::test]
async fn test_explicit_info_wins_over_resolved_link() {
    let harness = TestHarness::new(fixtures::media_report(&["ja"], &["en"]));
    let input = harness.media_file("Frieren.S01E01.mkv");

    let mut opts = options(Category::AnimeRaw);
    opts.metadata = true;
    opts.info = Some("https://example.org/frieren".to_string());
    opts.skip_upload = true;
    let report = harness.runner(0).run(&input, &opts).await.unwrap();

    assert_eq!(report.information, "https://example.org/frieren");
    // Non-English categories prefer the English title.
    assert!(report
        .display_name
        .ends_with("(Frieren: Beyond Journey's End)"));
}

#[tokio::test]
async fn test_media_report_hides_absolute_path() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    let input = harness.media_file("Show.S01E03.mkv");
    harness
        .probe
        .set_text_report(format!("General\nComplete name : {}\n", input.display()))
        .await;

    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;
    harness.runner(0).run(&input, &opts).await.unwrap();

    let published = harness.paste.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0], "General\nComplete name : Show.S01E03.mkv\n");
}

#[tokio::test]
async fn test_paste_failure_is_not_fatal() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    harness.paste.set_failing(true).await;
    let input = harness.media_file("Show.S01E04.mkv");

    let report = harness
        .runner(0)
        .run(&input, &options(Category::LiveActionEnglish))
        .await
        .unwrap();
    assert!(report.media_report_url.is_none());
    assert!(!report.description.contains("Full MediaInfo"));
    assert!(report.is_success());
}

#[tokio::test]
async fn test_failed_provider_is_isolated() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    harness.api.fail_submissions_for("nyaa", "banned").await;
    let input = harness.media_file("Show.S01E05.mkv");

    let report = harness
        .runner(0)
        .run(&input, &options(Category::LiveActionEnglish))
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed_providers(), vec!["nyaa"]);
    assert!(matches!(
        &report.outcomes[1],
        ProviderOutcome::Succeeded { provider, .. } if provider == "mirror"
    ));
}

#[tokio::test]
async fn test_torrent_reused_across_runs() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    let input = harness.media_file("Show.S01E06.mkv");
    let runner = harness.runner(0);
    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;

    let first = runner.run(&input, &opts).await.unwrap();
    let second = runner.run(&input, &opts).await.unwrap();
    assert!(!first.torrent.reused);
    assert!(second.torrent.reused);
    assert_eq!(harness.backend.create_count().await, 1);

    opts.overwrite = true;
    let third = runner.run(&input, &opts).await.unwrap();
    assert!(!third.torrent.reused);
    assert_eq!(harness.backend.create_count().await, 2);
}

#[tokio::test]
async fn test_skip_upload_submits_nothing() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    let input = harness.media_file("Show.S01E07.mkv");
    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;

    let report = harness.runner(3).run(&input, &opts).await.unwrap();
    assert!(report.outcomes.is_empty());
    assert!(report.is_success());
    assert!(report.torrent.path.exists());
    assert!(harness.api.submissions().await.is_empty());
    assert_eq!(harness.extractor.extract_count().await, 0);
}

#[tokio::test]
async fn test_two_video_tracks_abort_before_packaging() {
    let mut report = fixtures::media_report(&["en"], &["en"]);
    let video = report
        .tracks
        .iter()
        .find(|t| t.track_type == "Video")
        .cloned()
        .unwrap();
    report.tracks.push(video);

    let harness = TestHarness::new(report);
    let input = harness.media_file("Show.S01E08.mkv");
    let err = harness
        .runner(0)
        .run(&input, &options(Category::LiveActionEnglish))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Media(_)));
    assert_eq!(err.category(), "media");
    assert_eq!(harness.backend.create_count().await, 0);
    assert!(harness.api.submissions().await.is_empty());
}

#[tokio::test]
async fn test_missing_subtitles_warn_only() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &[]));
    let input = harness.media_file("Show.S01E09.mkv");
    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;

    let report = harness.runner(0).run(&input, &opts).await.unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.description.contains("`Subtitles (0):` **N/A**"));
}

#[tokio::test]
async fn test_directory_release() {
    let harness = TestHarness::new(fixtures::media_report(&["en", "ja"], &["en"]));
    let release = harness.media_dir.path().join("Show.S01.1080p");
    std::fs::create_dir(&release).unwrap();
    std::fs::write(release.join("Show.S01E02.mkv"), b"2").unwrap();
    std::fs::write(release.join("Show.S01E01.mkv"), b"1").unwrap();

    let mut opts = options(Category::LiveActionEnglish);
    opts.skip_upload = true;
    let report = harness.runner(0).run(&release, &opts).await.unwrap();

    assert_eq!(report.display_name, "Show S01 1080p (Dual-Audio)");
    let requests = harness.backend.requests().await;
    assert_eq!(requests[0].content_path, release);
}

#[tokio::test]
async fn test_missing_input() {
    let harness = TestHarness::new(fixtures::media_report(&["en"], &["en"]));
    let err = harness
        .runner(0)
        .run(
            Path::new("/nonexistent/Show.S01E01.mkv"),
            &options(Category::AnimeEnglish),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::InputNotFound { .. }));
}
