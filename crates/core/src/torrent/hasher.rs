//! In-process torrent builder.
//!
//! Walks the payload, hashes it in fixed-size pieces with SHA-1 and writes a
//! v1 metainfo file through librqbit's torrent types. Hashing runs on the
//! blocking pool so progress can be reported per piece.

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::TorrentError;
use super::metainfo::{encode_metainfo, multi_file_info, single_file_info};
use super::traits::TorrentBackend;
use super::types::{is_excluded, HashProgress, ProgressCallback, TorrentRequest};

const MIN_PIECE_LENGTH: u64 = 1 << 15;
const MAX_PIECE_LENGTH: u64 = 1 << 24;
const TARGET_PIECES: u64 = 1500;

/// One payload file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PayloadFile {
    absolute: PathBuf,
    /// Components relative to the content root (empty for single-file torrents).
    relative: Vec<String>,
    length: u64,
}

/// Builtin SHA-1 piece hasher.
#[derive(Debug, Clone, Default)]
pub struct BuiltinBackend;

impl BuiltinBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TorrentBackend for BuiltinBackend {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn create(
        &self,
        request: &TorrentRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<(), TorrentError> {
        let request = request.clone();
        tokio::task::spawn_blocking(move || build_torrent(&request, progress.as_ref()))
            .await
            .map_err(|e| TorrentError::generation_failed(format!("hasher task: {}", e), None))?
    }
}

/// Power of two giving roughly `TARGET_PIECES` pieces, clamped to 32 KiB..16 MiB.
pub fn auto_piece_length(total_size: u64) -> u64 {
    let wanted = total_size.div_ceil(TARGET_PIECES).max(1);
    wanted
        .next_power_of_two()
        .clamp(MIN_PIECE_LENGTH, MAX_PIECE_LENGTH)
}

fn build_torrent(
    request: &TorrentRequest,
    progress: Option<&ProgressCallback>,
) -> Result<(), TorrentError> {
    let root = &request.content_path;
    if !root.exists() {
        return Err(TorrentError::ContentNotFound { path: root.clone() });
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TorrentError::generation_failed("content path has no name", None))?;

    let single_file = root.is_file();
    let files = if single_file {
        vec![PayloadFile {
            absolute: root.clone(),
            relative: Vec::new(),
            length: root.metadata()?.len(),
        }]
    } else {
        let mut files = Vec::new();
        collect_files(root, root, &mut files)?;
        files
    };

    if files.is_empty() {
        return Err(TorrentError::EmptyPayload { path: root.clone() });
    }

    let total_size: u64 = files.iter().map(|f| f.length).sum();
    let piece_length = request
        .piece_length
        .unwrap_or_else(|| auto_piece_length(total_size));
    let piece_length_u32 = u32::try_from(piece_length).map_err(|_| {
        TorrentError::generation_failed(format!("piece length {} too large", piece_length), None)
    })?;
    debug!(
        name = %name,
        files = files.len(),
        total_size,
        piece_length,
        "Hashing torrent payload"
    );

    let pieces = hash_pieces(&files, piece_length, total_size, progress)?;

    let info = if single_file {
        single_file_info(&name, total_size, piece_length_u32, pieces)
    } else {
        let entries: Vec<(u64, Vec<String>)> = files
            .iter()
            .map(|f| (f.length, f.relative.clone()))
            .collect();
        multi_file_info(&name, &entries, piece_length_u32, pieces)
    };
    let bytes = encode_metainfo(&info, &request.announces, request.source.as_deref())?;

    if let Some(parent) = request.output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&request.output_path, bytes)?;
    Ok(())
}

/// Collect payload files in sorted order, skipping sidecars.
fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<PayloadFile>,
) -> Result<(), TorrentError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(root, &path, out)?;
            continue;
        }
        if is_excluded(&path) {
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .map_err(|e| TorrentError::generation_failed(e.to_string(), None))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        out.push(PayloadFile {
            length: path.metadata()?.len(),
            absolute: path,
            relative,
        });
    }
    Ok(())
}

/// Hash the concatenated payload in `piece_length` chunks.
fn hash_pieces(
    files: &[PayloadFile],
    piece_length: u64,
    total_size: u64,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<u8>, TorrentError> {
    let pieces_total = total_size.div_ceil(piece_length);
    let mut pieces = Vec::with_capacity(pieces_total as usize * 20);
    let mut buf: Vec<u8> = Vec::with_capacity(piece_length as usize);
    let mut pieces_done = 0u64;

    let mut finish_piece = |buf: &mut Vec<u8>, file: &Path, pieces: &mut Vec<u8>| {
        pieces.extend_from_slice(&Sha1::digest(&buf[..]));
        buf.clear();
        pieces_done += 1;
        if let Some(cb) = progress {
            cb(&HashProgress {
                file: file.to_path_buf(),
                pieces_done,
                pieces_total,
            });
        }
    };

    for file in files {
        let mut handle = File::open(&file.absolute)?;
        loop {
            let want = piece_length - buf.len() as u64;
            let read = (&mut handle).take(want).read_to_end(&mut buf)? as u64;
            if buf.len() as u64 == piece_length {
                finish_piece(&mut buf, &file.absolute, &mut pieces);
            }
            if read < want {
                break;
            }
        }
    }

    if !buf.is_empty() {
        if let Some(last) = files.last() {
            finish_piece(&mut buf, &last.absolute, &mut pieces);
        }
    }

    Ok(pieces)
}
