//! Preview snapshots.
//!
//! Frames are grabbed by a [`FrameExtractor`], filtered, and published
//! through an [`ImageHost`]. The resulting URLs are rendered as a markdown
//! grid for the release description.

mod error;
mod extractor;
mod gallery;
mod host;
mod pipeline;

pub use error::SnapshotError;
pub use extractor::{normalize_image, FfmpegExtractor, FrameExtractor};
pub use gallery::{grid_columns, render_gallery};
pub use host::{ImageHost, KekClient};
pub use pipeline::{
    candidate_timestamps, select_candidates, snapshot_path, Snapshot, SnapshotOptions,
    SnapshotPipeline, SnapshotSet,
};
