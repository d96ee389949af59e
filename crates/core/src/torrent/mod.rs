//! Torrent packaging.
//!
//! The packager owns the artifact lifecycle (reuse, overwrite, announce list)
//! and delegates generation to a [`TorrentBackend`]: the builtin piece hasher
//! or the external `mkbrr` tool. Every artifact is parsed back before use.

mod error;
mod hasher;
mod inspect;
pub mod metainfo;
mod mkbrr;
mod packager;
mod trackers;
mod traits;
mod types;

pub use error::TorrentError;
pub use hasher::{auto_piece_length, BuiltinBackend};
pub use inspect::{inspect_torrent, TorrentFile, TorrentSummary};
pub use mkbrr::MkbrrBackend;
pub use packager::TorrentPackager;
pub use trackers::{fetch_public_trackers, merge_announces, parse_tracker_list};
pub use traits::TorrentBackend;
pub use types::{
    artifact_path, is_excluded, HashProgress, PackagedTorrent, ProgressCallback,
    TorrentBackendKind, TorrentRequest, EXCLUDED_EXTENSIONS,
};
