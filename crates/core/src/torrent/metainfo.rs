//! v1 metainfo files built from librqbit's torrent types.

use librqbit_bencode::{bencode_serialize_to_writer, ByteBufOwned};
use librqbit_core::torrent_metainfo::{TorrentMetaV1File, TorrentMetaV1Info};
use serde::Serialize;

use super::error::TorrentError;

const CREATED_BY: &str = concat!("seedpost/", env!("CARGO_PKG_VERSION"));

/// Info dictionary plus the `source` key private trackers expect.
///
/// `source` changes the info hash, so it has to live inside `info`.
#[derive(Serialize)]
struct SourcedInfo<'a> {
    #[serde(flatten)]
    info: &'a TorrentMetaV1Info<ByteBufOwned>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Serialize)]
struct MetaFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    announce: Option<&'a str>,
    #[serde(rename = "announce-list", skip_serializing_if = "Vec::is_empty")]
    announce_list: Vec<Vec<&'a str>>,
    #[serde(rename = "created by")]
    created_by: &'a str,
    info: SourcedInfo<'a>,
}

/// Info dictionary of a single-file torrent.
pub fn single_file_info(
    name: &str,
    length: u64,
    piece_length: u32,
    pieces: Vec<u8>,
) -> TorrentMetaV1Info<ByteBufOwned> {
    TorrentMetaV1Info {
        name: Some(buf(name)),
        pieces: pieces.into(),
        piece_length,
        length: Some(length),
        ..Default::default()
    }
}

/// Info dictionary of a multi-file torrent. `files` holds the length and
/// path components relative to the content root.
pub fn multi_file_info(
    name: &str,
    files: &[(u64, Vec<String>)],
    piece_length: u32,
    pieces: Vec<u8>,
) -> TorrentMetaV1Info<ByteBufOwned> {
    let files = files
        .iter()
        .map(|(length, path)| TorrentMetaV1File {
            length: *length,
            path: path.iter().map(|c| buf(c)).collect(),
            attr: None,
            sha1: None,
            symlink_path: None,
        })
        .collect();

    TorrentMetaV1Info {
        name: Some(buf(name)),
        pieces: pieces.into(),
        piece_length,
        files: Some(files),
        ..Default::default()
    }
}

/// Bencode a metainfo file. The first announce URL goes into `announce`,
/// and with more than one URL each gets its own tier in `announce-list`.
pub fn encode_metainfo(
    info: &TorrentMetaV1Info<ByteBufOwned>,
    announces: &[String],
    source: Option<&str>,
) -> Result<Vec<u8>, TorrentError> {
    let file = MetaFile {
        announce: announces.first().map(String::as_str),
        announce_list: if announces.len() > 1 {
            announces.iter().map(|url| vec![url.as_str()]).collect()
        } else {
            Vec::new()
        },
        created_by: CREATED_BY,
        info: SourcedInfo { info, source },
    };

    let mut out = Vec::new();
    bencode_serialize_to_writer(&file, &mut out)
        .map_err(|e| TorrentError::generation_failed(format!("bencode: {}", e), None))?;
    Ok(out)
}

fn buf(s: &str) -> ByteBufOwned {
    ByteBufOwned::from(s.as_bytes())
}
