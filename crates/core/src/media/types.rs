//! Types for media probing and track descriptors.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Probe output (mediainfo JSON)
// ---------------------------------------------------------------------------

/// Top level of `mediainfo --Output=JSON`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MiOutput {
    pub media: Option<MiMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MiMedia {
    #[serde(default)]
    pub track: Vec<RawTrack>,
}

/// One track as reported by the media probe. All values are kept as strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawTrack {
    #[serde(rename = "@type")]
    pub track_type: String,

    #[serde(rename = "Language", default)]
    pub language: Option<String>,

    #[serde(rename = "Title", default)]
    pub title: Option<String>,

    #[serde(rename = "Format", default)]
    pub format: Option<String>,

    #[serde(rename = "Format_Profile", default)]
    pub format_profile: Option<String>,

    #[serde(rename = "Format_Level", default)]
    pub format_level: Option<String>,

    #[serde(rename = "Format_AdditionalFeatures", default)]
    pub format_additional_features: Option<String>,

    #[serde(rename = "InternetMediaType", default)]
    pub internet_media_type: Option<String>,

    #[serde(rename = "BitRate", default)]
    pub bit_rate: Option<String>,

    #[serde(rename = "StreamSize", default)]
    pub stream_size: Option<String>,

    #[serde(rename = "Duration", default)]
    pub duration: Option<String>,

    #[serde(rename = "Duration_String3", default)]
    pub duration_string3: Option<String>,

    #[serde(rename = "Width", default)]
    pub width: Option<String>,

    #[serde(rename = "Height", default)]
    pub height: Option<String>,

    #[serde(rename = "FrameRate_String", default)]
    pub frame_rate_string: Option<String>,

    #[serde(rename = "Channels", default)]
    pub channels: Option<String>,

    #[serde(rename = "MenuCount", default)]
    pub menu_count: Option<String>,
}

impl RawTrack {
    /// Create an empty track of the given type.
    pub fn new(track_type: &str) -> Self {
        Self {
            track_type: track_type.to_string(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> Option<TrackKind> {
        match self.track_type.as_str() {
            "Video" => Some(TrackKind::Video),
            "Audio" => Some(TrackKind::Audio),
            "Text" => Some(TrackKind::Subtitle),
            _ => None,
        }
    }

    pub(crate) fn duration_secs(&self) -> Option<f64> {
        parse_number(self.duration.as_deref())
    }

    pub(crate) fn bit_rate_bps(&self) -> Option<f64> {
        parse_number(self.bit_rate.as_deref())
    }

    pub(crate) fn stream_size_bytes(&self) -> Option<f64> {
        parse_number(self.stream_size.as_deref())
    }
}

/// Parse a probe number. Multi-value fields ("640000 / 640000") use the first value.
pub(crate) fn parse_number(value: Option<&str>) -> Option<f64> {
    let value = value?.split('/').next()?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Parsed probe result for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaReport {
    pub tracks: Vec<RawTrack>,
}

impl MediaReport {
    pub fn new(tracks: Vec<RawTrack>) -> Self {
        Self { tracks }
    }

    /// The General (container) track.
    pub fn general(&self) -> Option<&RawTrack> {
        self.tracks.iter().find(|t| t.track_type == "General")
    }

    /// Container duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.general().and_then(RawTrack::duration_secs)
    }

    /// A fast probe is incomplete when the General duration or any
    /// General/Audio bitrate is missing.
    pub fn is_incomplete(&self) -> bool {
        let missing_duration = self.duration_secs().is_none();
        let missing_bitrate = self
            .tracks
            .iter()
            .filter(|t| t.track_type == "General" || t.track_type == "Audio")
            .any(|t| t.bit_rate_bps().is_none());
        missing_duration || missing_bitrate
    }
}

/// How thoroughly the probe parses the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFidelity {
    /// Low-fidelity pass (`ParseSpeed=0.5`).
    Fast,
    /// Full pass (`ParseSpeed=1`).
    Full,
}

impl ProbeFidelity {
    pub fn parse_speed(&self) -> &'static str {
        match self {
            Self::Fast => "0.5",
            Self::Full => "1",
        }
    }
}

// ---------------------------------------------------------------------------
// Track descriptors
// ---------------------------------------------------------------------------

/// Kind of a media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

/// Accessibility/role tags recognized in track titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackFlag {
    #[serde(rename = "CC")]
    ClosedCaptions,
    #[serde(rename = "SDH")]
    Sdh,
    Forced,
    Dubtitle,
    #[serde(rename = "MTL")]
    MachineTranslated,
}

impl TrackFlag {
    pub const ALL: [TrackFlag; 5] = [
        TrackFlag::ClosedCaptions,
        TrackFlag::Sdh,
        TrackFlag::Forced,
        TrackFlag::Dubtitle,
        TrackFlag::MachineTranslated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClosedCaptions => "CC",
            Self::Sdh => "SDH",
            Self::Forced => "Forced",
            Self::Dubtitle => "Dubtitle",
            Self::MachineTranslated => "MTL",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

/// Language, title and flag of an audio or subtitle track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLabel {
    /// Raw language tag from the probe ("en", "ja-JP").
    pub language: Option<String>,
    /// Display name with regional qualifiers dropped ("English"), "Und" when unknown.
    pub language_name: String,
    /// Free-form title with any recognized flag removed.
    pub title: Option<String>,
    pub flag: Option<TrackFlag>,
}

/// Summary of the video track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    pub codec: String,
    /// `Profile@LLevel`, when the probe reports both.
    pub profile: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub bitrate_bps: Option<f64>,
    pub frame_rate: Option<String>,
}

/// Summary of an audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioDescriptor {
    pub label: TrackLabel,
    /// Display codec ("DDP", "FLAC").
    pub codec: String,
    /// Channel layout ("5.1"), "?" when unknown.
    pub channels: String,
    pub atmos: bool,
    pub bitrate_kbps: Option<u64>,
}

/// Summary of a subtitle track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    pub label: TrackLabel,
    /// Display codec ("SRT", "ASS").
    pub codec: String,
}

/// Structured summary of one track. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackDescriptor {
    Video(VideoDescriptor),
    Audio(AudioDescriptor),
    Subtitle(SubtitleDescriptor),
}

impl TrackDescriptor {
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Video(_) => TrackKind::Video,
            Self::Audio(_) => TrackKind::Audio,
            Self::Subtitle(_) => TrackKind::Subtitle,
        }
    }
}

/// All descriptors of a file plus the derived counts the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub video: VideoDescriptor,
    pub audio: Vec<AudioDescriptor>,
    pub subtitles: Vec<SubtitleDescriptor>,
    /// Unique non-empty audio language tags.
    pub distinct_audio_languages: usize,
    /// Unique non-empty subtitle language tags.
    pub distinct_subtitle_languages: usize,
    pub has_chapters: bool,
    /// Container duration in seconds.
    pub duration_secs: Option<f64>,
    /// Human duration ("00:23:40.123"), when reported.
    pub duration_display: Option<String>,
    /// Non-fatal problems found while describing.
    pub warnings: Vec<String>,
}

impl TrackSummary {
    /// Descriptors in video, audio, subtitle order.
    pub fn descriptors(&self) -> Vec<TrackDescriptor> {
        std::iter::once(TrackDescriptor::Video(self.video.clone()))
            .chain(self.audio.iter().cloned().map(TrackDescriptor::Audio))
            .chain(self.subtitles.iter().cloned().map(TrackDescriptor::Subtitle))
            .collect()
    }

    /// Audio count used for tags and the description header.
    pub fn audio_count(&self, real_length: bool) -> usize {
        if real_length {
            self.audio.len()
        } else {
            self.distinct_audio_languages
        }
    }

    /// Subtitle count used for tags and the description header.
    pub fn subtitle_count(&self, real_length: bool) -> usize {
        if real_length {
            self.subtitles.len()
        } else {
            self.distinct_subtitle_languages
        }
    }
}
