//! Release jobs.
//!
//! A job takes one input path through probing, packaging, description,
//! metadata enrichment and the provider uploads. Stages return `Result`;
//! the runner decides which failures abort the job and which are only
//! logged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::category::Category;
use crate::config::Config;
use crate::description::{build_description, DescriptionOptions};
use crate::error::JobError;
use crate::media::{inspect_media, MediaProbe, TrackSummary};
use crate::metadata::{
    extract_search_name, resolve_metadata, select_title, MetadataQuery, MetadataResolver,
};
use crate::naming::{format_display_name, release_tags, TagOptions};
use crate::paste::PasteService;
use crate::retry::RetryPolicy;
use crate::snapshot::SnapshotPipeline;
use crate::torrent::{merge_announces, PackagedTorrent, TorrentError, TorrentPackager};
use crate::upload::{
    Provider, ProviderOutcome, ReleaseFlags, ReleaseUpload, SnapshotSource, TorrentPayload,
    UploadForm, UploadOrchestrator,
};

const MEDIA_EXTENSIONS: [&str; 2] = ["mkv", "mp4"];

/// Per-run choices, usually from the command line on top of preferences.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub category: Category,
    pub tags: TagOptions,
    pub flags: ReleaseFlags,
    pub note: Option<String>,
    pub advert: Option<String>,
    /// Information link sent with the upload.
    pub info: Option<String>,
    /// Look up catalog metadata for anime categories.
    pub metadata: bool,
    /// Catalog page to resolve instead of searching by name.
    pub metadata_link: Option<String>,
    /// Publish the full media report and link it.
    pub media_report: bool,
    pub edit_code: Option<String>,
    pub real_length: bool,
    pub overwrite: bool,
    /// Package and describe without uploading.
    pub skip_upload: bool,
}

impl JobOptions {
    /// Defaults for `category` taken from the configuration.
    ///
    /// A preference information link other than `mal` is used as is and
    /// turns metadata lookups off.
    pub fn from_config(config: &Config, category: Category) -> Self {
        let prefs = &config.preferences;
        let info = prefs
            .info
            .clone()
            .filter(|i| !i.is_empty() && !i.eq_ignore_ascii_case("mal"));

        Self {
            category,
            tags: TagOptions::default(),
            flags: ReleaseFlags {
                trusted: config.trusted,
                ..Default::default()
            },
            note: None,
            advert: prefs.advert.clone(),
            metadata: info.is_none(),
            info,
            metadata_link: None,
            media_report: prefs.mediainfo,
            edit_code: prefs.edit_code.clone(),
            real_length: prefs.real_length,
            overwrite: false,
            skip_upload: false,
        }
    }
}

/// The media file and naming of an input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInput {
    /// File or directory that is packaged.
    pub content_path: PathBuf,
    /// File that is probed and snapshotted.
    pub media_file: PathBuf,
    pub name: String,
}

/// Resolve an input path.
///
/// A file is used directly and named after itself without `.mkv`/`.mp4`.
/// A directory is named after itself and probed through its first media
/// file in sorted order.
pub async fn resolve_input(path: &Path) -> Result<ReleaseInput, JobError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| JobError::InputNotFound {
            path: path.to_path_buf(),
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if metadata.is_file() {
        let name = MEDIA_EXTENSIONS
            .iter()
            .find_map(|ext| file_name.strip_suffix(&format!(".{}", ext)))
            .unwrap_or(&file_name)
            .to_string();
        return Ok(ReleaseInput {
            content_path: path.to_path_buf(),
            media_file: path.to_path_buf(),
            name,
        });
    }

    let mut media_files = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let candidate = entry.path();
        let is_media = candidate
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| MEDIA_EXTENSIONS.contains(&e));
        if is_media && entry.file_type().await?.is_file() {
            media_files.push(candidate);
        }
    }
    media_files.sort();

    let media_file = media_files
        .into_iter()
        .next()
        .ok_or_else(|| JobError::NoMediaFile {
            path: path.to_path_buf(),
        })?;

    Ok(ReleaseInput {
        content_path: path.to_path_buf(),
        media_file,
        name: file_name,
    })
}

/// Per-release cache directory.
pub fn release_cache_dir(cache_root: &Path, name: &str) -> PathBuf {
    cache_root.join(format!("{}_files", name))
}

/// Everything a finished job produced.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub display_name: String,
    pub torrent: PackagedTorrent,
    pub information: String,
    pub description: String,
    pub media_report_url: Option<String>,
    /// Non-fatal problems found while describing the tracks.
    pub warnings: Vec<String>,
    /// Empty when the upload was skipped.
    pub outcomes: Vec<ProviderOutcome>,
}

impl JobReport {
    /// Whether every provider succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ProviderOutcome::is_success)
    }

    pub fn failed_providers(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(ProviderOutcome::provider)
            .collect()
    }
}

/// Runs release jobs against a fixed set of providers and services.
pub struct JobRunner {
    probe: Arc<dyn MediaProbe>,
    packager: TorrentPackager,
    orchestrator: UploadOrchestrator,
    providers: Vec<Provider>,
    cache_root: PathBuf,
    snapshots: Option<SnapshotPipeline>,
    paste: Option<Arc<dyn PasteService>>,
    resolver: Option<Arc<dyn MetadataResolver>>,
    resolver_policy: RetryPolicy,
}

impl JobRunner {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        packager: TorrentPackager,
        orchestrator: UploadOrchestrator,
        providers: Vec<Provider>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe,
            packager,
            orchestrator,
            providers,
            cache_root: cache_root.into(),
            snapshots: None,
            paste: None,
            resolver: None,
            resolver_policy: RetryPolicy::exponential(3, std::time::Duration::from_secs(1)),
        }
    }

    pub fn with_snapshots(mut self, pipeline: SnapshotPipeline) -> Self {
        self.snapshots = Some(pipeline);
        self
    }

    pub fn with_paste(mut self, paste: Arc<dyn PasteService>) -> Self {
        self.paste = Some(paste);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn MetadataResolver>, policy: RetryPolicy) -> Self {
        self.resolver = Some(resolver);
        self.resolver_policy = policy;
        self
    }

    /// Union of every provider's announce list, in provider order.
    pub fn announces(&self) -> Vec<String> {
        let mut announces = Vec::new();
        for provider in &self.providers {
            merge_announces(&mut announces, provider.announces.iter().cloned());
        }
        announces
    }

    /// Run one job to completion.
    pub async fn run(&self, path: &Path, options: &JobOptions) -> Result<JobReport, JobError> {
        let input = resolve_input(path).await?;
        let cache_dir = release_cache_dir(&self.cache_root, &input.name);
        info!(
            name = %input.name,
            media = %input.media_file.display(),
            cache_dir = %cache_dir.display(),
            "Starting release job"
        );

        let tracks = inspect_media(self.probe.as_ref(), &input.media_file).await?;
        for warning in &tracks.warnings {
            warn!(name = %input.name, "{}", warning);
        }

        let torrent = self
            .packager
            .package(
                &input.name,
                &input.content_path,
                &cache_dir,
                &self.announces(),
                options.overwrite,
            )
            .await?;

        let media_report_url = if options.media_report {
            self.publish_media_report(&input.media_file, options.edit_code.as_deref())
                .await
        } else {
            None
        };

        let description = build_description(
            &tracks,
            &DescriptionOptions {
                note: options.note.clone(),
                advert: options.advert.clone(),
                real_length: options.real_length,
                media_report_url: media_report_url.clone(),
            },
        );

        let (title, resolved_info) = self.lookup_metadata(&input.name, options).await;
        let information = options
            .info
            .clone()
            .or(resolved_info)
            .unwrap_or_default();

        let tags = release_tags(
            title,
            &options.tags,
            tracks.audio_count(options.real_length),
            tracks.subtitle_count(options.real_length),
        );
        let display_name = format_display_name(&input.name, &tags);
        info!(display_name = %display_name, "Release described");

        let outcomes = if options.skip_upload {
            info!(name = %input.name, "Upload skipped");
            Vec::new()
        } else {
            let form = UploadForm {
                display_name: display_name.clone(),
                category: options.category,
                information: information.clone(),
                description: description.clone(),
                flags: options.flags,
            };
            self.upload(&input, &cache_dir, &tracks, &torrent, form).await?
        };

        Ok(JobReport {
            name: input.name,
            display_name,
            torrent,
            information,
            description,
            media_report_url,
            warnings: tracks.warnings,
            outcomes,
        })
    }

    async fn publish_media_report(&self, media_file: &Path, edit_code: Option<&str>) -> Option<String> {
        let paste = self.paste.as_ref()?;

        let text = match self.probe.text_report(media_file).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to read the media report");
                return None;
            }
        };
        let file_name = media_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = text.replace(&media_file.to_string_lossy().to_string(), &file_name);

        match paste.publish(&text, edit_code).await {
            Ok(published) => {
                info!(url = %published.url, "Media report published");
                Some(published.url)
            }
            Err(e) => {
                warn!(service = paste.name(), error = %e, "Failed to publish the media report");
                None
            }
        }
    }

    /// Display-name title and information link from the catalog.
    async fn lookup_metadata(
        &self,
        name: &str,
        options: &JobOptions,
    ) -> (Option<String>, Option<String>) {
        let Some(resolver) = &self.resolver else {
            return (None, None);
        };
        if !options.category.is_anime() || !options.metadata {
            debug!(category = %options.category, "Metadata lookup disabled");
            return (None, None);
        }

        let search_name = extract_search_name(name);
        let query = match &options.metadata_link {
            Some(link) => MetadataQuery::Link(link.clone()),
            None => MetadataQuery::Name(search_name.clone()),
        };

        match resolve_metadata(resolver.as_ref(), &query, &self.resolver_policy).await {
            Some(resolved) => {
                let title = select_title(
                    &resolved.entry,
                    &search_name,
                    options.category.is_non_english(),
                );
                (title, Some(resolved.info_url))
            }
            None => (None, None),
        }
    }

    async fn upload(
        &self,
        input: &ReleaseInput,
        cache_dir: &Path,
        tracks: &TrackSummary,
        torrent: &PackagedTorrent,
        form: UploadForm,
    ) -> Result<Vec<ProviderOutcome>, JobError> {
        let bytes = tokio::fs::read(&torrent.path)
            .await
            .map_err(|e| TorrentError::invalid_artifact(&torrent.path, e.to_string()))?;
        let file_name = torrent
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.torrent", input.name));

        let snapshots = self
            .snapshots
            .as_ref()
            .filter(|pipeline| pipeline.options().count > 0)
            .map(|pipeline| SnapshotSource {
                pipeline,
                input: &input.media_file,
                tracks,
                cache_dir,
            });

        let release = ReleaseUpload {
            torrent: TorrentPayload { file_name, bytes },
            torrent_path: &torrent.path,
            form,
            snapshots,
        };

        Ok(self.orchestrator.run(&self.providers, &release).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[tokio::test]
    async fn test_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Show.S01E01.1080p.mkv");
        std::fs::write(&file, b"video").unwrap();

        let input = resolve_input(&file).await.unwrap();
        assert_eq!(input.name, "Show.S01E01.1080p");
        assert_eq!(input.media_file, file);
        assert_eq!(input.content_path, file);
    }

    #[tokio::test]
    async fn test_directory_input_uses_first_sorted_media_file() {
        let dir = tempfile::tempdir().unwrap();
        let release = dir.path().join("Show.S01.1080p");
        std::fs::create_dir(&release).unwrap();
        std::fs::write(release.join("Show.S01E02.mkv"), b"2").unwrap();
        std::fs::write(release.join("Show.S01E01.mp4"), b"1").unwrap();
        std::fs::write(release.join("Show.S01E00.nfo"), b"nfo").unwrap();

        let input = resolve_input(&release).await.unwrap();
        assert_eq!(input.name, "Show.S01.1080p");
        assert_eq!(input.media_file, release.join("Show.S01E01.mp4"));
        assert_eq!(input.content_path, release);
    }

    #[tokio::test]
    async fn test_directory_without_media() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let err = resolve_input(dir.path()).await.unwrap_err();
        assert!(matches!(err, JobError::NoMediaFile { .. }));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let err = resolve_input(Path::new("/nonexistent/Show.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InputNotFound { .. }));
        assert_eq!(err.category(), "input");
    }

    #[test]
    fn test_cache_dir_is_namespaced() {
        assert_eq!(
            release_cache_dir(Path::new("/cache"), "Show.S01E01"),
            PathBuf::from("/cache/Show.S01E01_files")
        );
    }

    #[test]
    fn test_options_from_preferences() {
        let config = load_config_from_str(
            r#"
trusted = true

[preferences]
info = "https://example.org/show"
real_length = true
advert = "Encoded by GRP"

[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"
"#,
        )
        .unwrap();

        let options = JobOptions::from_config(&config, Category::AnimeRaw);
        assert!(options.flags.trusted);
        assert!(options.real_length);
        assert!(!options.metadata);
        assert_eq!(options.info.as_deref(), Some("https://example.org/show"));
        assert_eq!(options.advert.as_deref(), Some("Encoded by GRP"));
    }

    #[test]
    fn test_mal_preference_keeps_lookups() {
        let config = load_config_from_str(
            r#"
[preferences]
info = "MAL"

[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"
"#,
        )
        .unwrap();

        let options = JobOptions::from_config(&config, Category::AnimeEnglish);
        assert!(options.metadata);
        assert!(options.info.is_none());
    }
}
