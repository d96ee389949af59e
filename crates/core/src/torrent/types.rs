//! Types for torrent packaging.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sidecar files never included in the payload.
static EXCLUDED_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\.(ffindex|jpg|nfo|png|torrent|txt|json)$").unwrap());

/// Extensions matched by the exclusion pattern, for backends that take globs.
pub const EXCLUDED_EXTENSIONS: [&str; 7] =
    ["ffindex", "jpg", "nfo", "png", "torrent", "txt", "json"];

/// Whether a payload file is a sidecar that must be left out.
pub fn is_excluded(path: &Path) -> bool {
    EXCLUDED_FILE_RE.is_match(&path.to_string_lossy())
}

/// Available packaging backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentBackendKind {
    /// In-process piece hasher.
    #[default]
    Builtin,
    /// External `mkbrr create`.
    Mkbrr,
}

/// Everything a backend needs to write one torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentRequest {
    /// File or directory to package.
    pub content_path: PathBuf,
    /// Where the `.torrent` is written.
    pub output_path: PathBuf,
    /// Announce URLs, each in its own tier.
    pub announces: Vec<String>,
    /// Source tag written into the info dictionary.
    pub source: Option<String>,
    /// Piece length in bytes; chosen from the payload size when unset.
    pub piece_length: Option<u64>,
}

/// Piece hashing progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashProgress {
    /// File the last completed piece ended in.
    pub file: PathBuf,
    pub pieces_done: u64,
    pub pieces_total: u64,
}

/// Receives per-piece progress from the builtin backend.
pub type ProgressCallback = Arc<dyn Fn(&HashProgress) + Send + Sync>;

/// Outcome of a packaging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedTorrent {
    pub path: PathBuf,
    /// The artifact already existed and was not regenerated.
    pub reused: bool,
}

/// Deterministic artifact location for a release.
pub fn artifact_path(cache_dir: &Path, name: &str) -> PathBuf {
    cache_dir.join(format!("{}.torrent", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_exclusion() {
        assert!(is_excluded(Path::new("Show/Show.S01E01.nfo")));
        assert!(is_excluded(Path::new("Show/cover.jpg")));
        assert!(is_excluded(Path::new("Show/Show.S01E01.mkv.ffindex")));
        assert!(!is_excluded(Path::new("Show/Show.S01E01.mkv")));
        assert!(!is_excluded(Path::new("Show/Show.S01E01.ass")));
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("/cache/Show_files"), "Show.S01E01"),
            PathBuf::from("/cache/Show_files/Show.S01E01.torrent")
        );
    }
}
