//! Torrent artifact inspection.
//!
//! Uses librqbit-core to parse a generated `.torrent` so that every backend's
//! output is checked the same way before it is uploaded.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

/// A file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFile {
    /// Path including the torrent name as the first component.
    pub path: String,
    pub size_bytes: u64,
}

/// What a parsed torrent contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentSummary {
    pub name: String,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub files: Vec<TorrentFile>,
    pub total_size: u64,
    /// Announce URLs, tiers flattened.
    pub announces: Vec<String>,
}

/// Parse a `.torrent` and summarize it.
///
/// Supports both single-file and multi-file torrents. Errors are returned as
/// plain strings; callers attach the artifact path.
pub fn inspect_torrent(bytes: &[u8]) -> Result<TorrentSummary, String> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| format!("failed to parse torrent: {}", e))?;

    let info = &torrent.info;

    let name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let files = if let Some(ref files) = info.files {
        files
            .iter()
            .map(|file| {
                let mut parts = vec![name.clone()];
                parts.extend(file.path.iter().map(|p| bytes_to_string(p.as_ref())));
                TorrentFile {
                    path: parts.join("/"),
                    size_bytes: file.length,
                }
            })
            .collect()
    } else if let Some(length) = info.length {
        vec![TorrentFile {
            path: name.clone(),
            size_bytes: length,
        }]
    } else {
        Vec::new()
    };

    if files.is_empty() {
        return Err("torrent has no files".to_string());
    }

    Ok(TorrentSummary {
        total_size: files.iter().map(|f| f.size_bytes).sum(),
        name,
        info_hash: torrent.info_hash.as_string(),
        announces: torrent
            .iter_announce()
            .map(|url| bytes_to_string(url.as_ref()))
            .collect(),
        files,
    })
}

/// Convert bytes to a UTF-8 string, replacing invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent::metainfo::{encode_metainfo, single_file_info};

    fn single_file_torrent() -> Vec<u8> {
        encode_metainfo(
            &single_file_info("Show.S01E01.mkv", 1024, 32768, vec![0u8; 20]),
            &["http://tracker.example/announce".to_string()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_inspect_single_file() {
        let summary = inspect_torrent(&single_file_torrent()).unwrap();
        assert_eq!(summary.name, "Show.S01E01.mkv");
        assert_eq!(summary.total_size, 1024);
        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.info_hash.len(), 40);
        assert_eq!(summary.announces, vec!["http://tracker.example/announce"]);
        assert!(summary
            .info_hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_inspect_garbage_fails() {
        assert!(inspect_torrent(b"not a torrent").is_err());
    }
}
