use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::torrent::TorrentBackendKind;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root of the per-release cache directories.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Mark uploads as trusted.
    #[serde(default)]
    pub trusted: bool,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub torrent: TorrentConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
    #[serde(default)]
    pub paste: PasteConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("seedpost")
}

/// User preferences that shape the release description and behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    /// Upload the full text media report to the paste service.
    #[serde(default = "default_true")]
    pub mediainfo: bool,
    /// Send a Telegram notification after a successful upload.
    #[serde(default)]
    pub telegram: bool,
    /// Count raw tracks instead of distinct languages.
    #[serde(default)]
    pub real_length: bool,
    /// Text appended under the note in every description.
    #[serde(default)]
    pub advert: Option<String>,
    /// Directory receiving a copy of each uploaded torrent.
    #[serde(default)]
    pub watch_dir: Option<PathBuf>,
    /// Draw snapshot timestamps randomly within their window.
    #[serde(default)]
    pub random_snapshots: bool,
    /// Default information link. Disables metadata lookups when set.
    #[serde(default)]
    pub info: Option<String>,
    /// Edit code for the media report paste.
    #[serde(default)]
    pub edit_code: Option<String>,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            mediainfo: true,
            telegram: false,
            real_length: false,
            advert: None,
            watch_dir: None,
            random_snapshots: false,
            info: None,
            edit_code: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A configured upload destination.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Base URL (e.g., "https://nyaa.si")
    pub domain: String,
    /// Credentials in the form `username:password`.
    pub credentials: String,
    #[serde(default)]
    pub proxy: Option<String>,
    /// Announce URLs embedded in the torrent.
    #[serde(default)]
    pub announces: Vec<String>,
    /// Netscape cookies.txt exported from a logged-in browser session.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
}

/// Torrent packaging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentConfig {
    #[serde(default)]
    pub backend: TorrentBackendKind,
    /// Path to the mkbrr binary (default: "mkbrr").
    #[serde(default = "default_mkbrr_path")]
    pub mkbrr_path: PathBuf,
    /// Source tag written into the info dictionary.
    #[serde(default = "default_source")]
    pub source: String,
    /// Piece length in bytes. Chosen from the payload size when unset.
    #[serde(default)]
    pub piece_length: Option<u64>,
    /// Append the public tracker list to the announce list.
    #[serde(default)]
    pub add_public_trackers: bool,
    /// Remote list of public trackers, one URL per line.
    #[serde(default = "default_public_tracker_url")]
    pub public_tracker_url: String,
}

impl Default for TorrentConfig {
    fn default() -> Self {
        Self {
            backend: TorrentBackendKind::default(),
            mkbrr_path: default_mkbrr_path(),
            source: default_source(),
            piece_length: None,
            add_public_trackers: false,
            public_tracker_url: default_public_tracker_url(),
        }
    }
}

fn default_mkbrr_path() -> PathBuf {
    PathBuf::from("mkbrr")
}

fn default_source() -> String {
    "nyaa.si".to_string()
}

fn default_public_tracker_url() -> String {
    "https://raw.githubusercontent.com/ngosang/trackerslist/master/trackers_best.txt".to_string()
}

/// Snapshot generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Number of snapshots to publish (0 disables snapshots).
    #[serde(default = "default_snapshot_count")]
    pub count: usize,
    /// Image file extension.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Path to the ffmpeg binary (default: "ffmpeg").
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Images above this size are rejected unless the image host is authenticated.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            count: default_snapshot_count(),
            extension: default_extension(),
            ffmpeg_path: default_ffmpeg_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_snapshot_count() -> usize {
    3
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_max_upload_bytes() -> u64 {
    5 * 1024 * 1024
}

/// Image host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageHostConfig {
    #[serde(default = "default_image_host_url")]
    pub url: String,
    /// Public URL prefix for uploaded images.
    #[serde(default = "default_image_public_url")]
    pub public_url: String,
    /// Sent as `x-kek-auth`; lifts the upload size cap.
    #[serde(default)]
    pub auth_key: Option<String>,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            url: default_image_host_url(),
            public_url: default_image_public_url(),
            auth_key: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_image_host_url() -> String {
    "https://kek.sh".to_string()
}

fn default_image_public_url() -> String {
    "https://i.kek.sh".to_string()
}

fn default_http_timeout() -> u64 {
    60
}

/// Paste service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasteConfig {
    #[serde(default = "default_paste_url")]
    pub base_url: String,
    #[serde(default = "default_paste_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts.
    #[serde(default = "default_paste_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            base_url: default_paste_url(),
            max_attempts: default_paste_attempts(),
            retry_delay_ms: default_paste_delay_ms(),
        }
    }
}

fn default_paste_url() -> String {
    "https://rentry.co".to_string()
}

fn default_paste_attempts() -> u32 {
    5
}

fn default_paste_delay_ms() -> u64 {
    1000
}

/// Telegram notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Media probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Path to the mediainfo binary (default: "mediainfo").
    #[serde(default = "default_mediainfo_path")]
    pub mediainfo_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mediainfo_path: default_mediainfo_path(),
        }
    }
}

fn default_mediainfo_path() -> PathBuf {
    PathBuf::from("mediainfo")
}

/// Anime metadata lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Jikan API base URL.
    #[serde(default = "default_metadata_url")]
    pub base_url: String,
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_metadata_attempts")]
    pub max_attempts: u32,
    /// Base of the exponential backoff between lookups.
    #[serde(default = "default_metadata_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_url(),
            timeout_secs: default_metadata_timeout(),
            max_attempts: default_metadata_attempts(),
            backoff_ms: default_metadata_backoff_ms(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_metadata_timeout() -> u64 {
    30
}

fn default_metadata_attempts() -> u32 {
    3
}

fn default_metadata_backoff_ms() -> u64 {
    1000
}

/// Provider submission and edit retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,
    /// Base of the exponential backoff between submissions.
    #[serde(default = "default_submit_backoff_ms")]
    pub submit_backoff_ms: u64,
    #[serde(default = "default_edit_attempts")]
    pub edit_attempts: u32,
    /// Fixed delay between edit attempts.
    #[serde(default = "default_edit_delay_ms")]
    pub edit_delay_ms: u64,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            submit_attempts: default_submit_attempts(),
            submit_backoff_ms: default_submit_backoff_ms(),
            edit_attempts: default_edit_attempts(),
            edit_delay_ms: default_edit_delay_ms(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_submit_attempts() -> u32 {
    3
}

fn default_submit_backoff_ms() -> u64 {
    1000
}

fn default_edit_attempts() -> u32 {
    5
}

fn default_edit_delay_ms() -> u64 {
    5000
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub cache_dir: PathBuf,
    pub trusted: bool,
    pub preferences: SanitizedPreferences,
    pub providers: Vec<SanitizedProviderConfig>,
    pub torrent: TorrentConfig,
    pub snapshots: SnapshotConfig,
    pub image_host_url: String,
    pub image_host_authenticated: bool,
    pub paste_url: String,
    pub telegram_configured: bool,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPreferences {
    pub mediainfo: bool,
    pub telegram: bool,
    pub real_length: bool,
    pub random_snapshots: bool,
    pub watch_dir: Option<PathBuf>,
    pub info: Option<String>,
    pub edit_code_configured: bool,
}

/// Sanitized provider (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub name: String,
    pub domain: String,
    pub proxy_configured: bool,
    pub announces: usize,
    pub cookies_file: Option<PathBuf>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let prefs = &config.preferences;
        Self {
            cache_dir: config.cache_dir.clone(),
            trusted: config.trusted,
            preferences: SanitizedPreferences {
                mediainfo: prefs.mediainfo,
                telegram: prefs.telegram,
                real_length: prefs.real_length,
                random_snapshots: prefs.random_snapshots,
                watch_dir: prefs.watch_dir.clone(),
                info: prefs.info.clone(),
                edit_code_configured: prefs.edit_code.is_some(),
            },
            providers: config
                .providers
                .iter()
                .map(|p| SanitizedProviderConfig {
                    name: p.name.clone(),
                    domain: p.domain.clone(),
                    proxy_configured: p.proxy.is_some(),
                    announces: p.announces.len(),
                    cookies_file: p.cookies_file.clone(),
                })
                .collect(),
            torrent: config.torrent.clone(),
            snapshots: config.snapshots.clone(),
            image_host_url: config.image_host.url.clone(),
            image_host_authenticated: config.image_host.auth_key.is_some(),
            paste_url: config.paste.base_url.clone(),
            telegram_configured: config.telegram.is_some(),
            upload: config.upload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.snapshots.count, 3);
        assert_eq!(config.snapshots.extension, "png");
        assert_eq!(config.snapshots.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.torrent.backend, TorrentBackendKind::Builtin);
        assert_eq!(config.torrent.source, "nyaa.si");
        assert_eq!(config.upload.submit_attempts, 3);
        assert_eq!(config.upload.edit_attempts, 5);
        assert!(config.preferences.mediainfo);
        assert!(!config.preferences.real_length);
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_deserialize_full_provider() {
        let toml = r#"
trusted = true

[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"
proxy = "socks5://127.0.0.1:1080"
announces = ["http://nyaa.tracker.wf:7777/announce"]
cookies_file = "/home/alice/cookies.txt"

[torrent]
backend = "mkbrr"
add_public_trackers = true
piece_length = 1048576
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let provider = &config.providers[0];
        assert!(config.trusted);
        assert_eq!(provider.announces.len(), 1);
        assert!(config.torrent.add_public_trackers);
        assert_eq!(config.torrent.backend, TorrentBackendKind::Mkbrr);
        assert_eq!(config.torrent.piece_length, Some(1048576));
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[[providers]]
name = "nyaa"
domain = "https://nyaa.si"
credentials = "alice:secret"

[image_host]
auth_key = "kek-key"

[telegram]
token = "123:abc"
chat_id = "42"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("kek-key"));
        assert!(!json.contains("123:abc"));
        assert!(sanitized.image_host_authenticated);
        assert!(sanitized.telegram_configured);
    }
}
