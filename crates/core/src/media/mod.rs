//! Media probing and track descriptors.
//!
//! The probe runs a fast pass first and a full pass only when the fast pass
//! leaves duration or bitrate fields empty. Tracks are then validated (one
//! video, at least one audio) and turned into display-ready descriptors.

mod describe;
mod error;
pub mod language;
mod probe;
mod types;

pub use describe::{describe_tracks, format_video_bitrate, split_title};
pub use error::MediaError;
pub use probe::{inspect_media, probe_media, MediaInfoCli, MediaProbe};
pub use types::{
    AudioDescriptor, MediaReport, ProbeFidelity, RawTrack, SubtitleDescriptor, TrackDescriptor,
    TrackFlag, TrackKind, TrackLabel, TrackSummary, VideoDescriptor,
};
