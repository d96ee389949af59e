//! Turns a media report into track descriptors and their display lines.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;
use tracing::warn;

use super::error::MediaError;
use super::language;
use super::types::{
    parse_number, AudioDescriptor, MediaReport, RawTrack, SubtitleDescriptor, TrackFlag,
    TrackKind, TrackLabel, TrackSummary, VideoDescriptor,
};

static FLAGGED_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*) \((CC|SDH|Forced|Dubtitle|MTL)\)$").unwrap());

/// Raw audio codec identifiers mapped to display labels.
fn audio_codec_label(format: &str) -> &str {
    match format {
        "E-AC-3" => "DDP",
        "AC-3" => "DD",
        "fLaC" => "FLAC",
        "DTS-UHD" => "DTS",
        other => other,
    }
}

/// Raw subtitle codec identifiers mapped to display labels.
fn subtitle_codec_label(format: &str) -> &str {
    match format {
        "UTF-8" => "SRT",
        other => other,
    }
}

/// Channel counts mapped to layout labels.
fn channel_layout(channels: Option<&str>) -> &'static str {
    match channels.map(str::trim) {
        Some("1") => "1.0",
        Some("2") => "2.0",
        Some("6") => "5.1",
        Some("8") => "7.1",
        _ => "?",
    }
}

/// Describe every track of a report.
///
/// Fails when the report does not contain exactly one video track or has no
/// audio track. Missing subtitles, languages and bitrates become warnings.
pub fn describe_tracks(report: &MediaReport) -> Result<TrackSummary, MediaError> {
    let mut warnings = Vec::new();
    let mut videos = Vec::new();
    let mut audio = Vec::new();
    let mut subtitles = Vec::new();
    let mut audio_languages = HashSet::new();
    let mut subtitle_languages = HashSet::new();

    for track in &report.tracks {
        match track.kind() {
            Some(TrackKind::Video) => videos.push(describe_video(track, &mut warnings)),
            Some(TrackKind::Audio) => {
                if let Some(lang) = non_empty(track.language.as_deref()) {
                    audio_languages.insert(lang.to_string());
                }
                audio.push(describe_audio(track, &mut warnings));
            }
            Some(TrackKind::Subtitle) => {
                if let Some(lang) = non_empty(track.language.as_deref()) {
                    subtitle_languages.insert(lang.to_string());
                }
                subtitles.push(SubtitleDescriptor {
                    label: track_label(track, &mut warnings),
                    codec: subtitle_codec_label(track.format.as_deref().unwrap_or("?"))
                        .to_string(),
                });
            }
            None => {}
        }
    }

    if videos.len() != 1 {
        return Err(MediaError::VideoTrackCount {
            count: videos.len(),
        });
    }
    if audio.is_empty() {
        return Err(MediaError::NoAudioTracks);
    }
    if subtitles.is_empty() {
        push_warning(&mut warnings, "No subtitle tracks found".to_string());
    }

    let general = report.general();
    let has_chapters = general
        .and_then(|g| parse_number(g.menu_count.as_deref()))
        .is_some_and(|count| count > 0.0);

    Ok(TrackSummary {
        video: videos.remove(0),
        audio,
        subtitles,
        distinct_audio_languages: audio_languages.len(),
        distinct_subtitle_languages: subtitle_languages.len(),
        has_chapters,
        duration_secs: report.duration_secs(),
        duration_display: general.and_then(|g| g.duration_string3.clone()),
        warnings,
    })
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{}", message);
    warnings.push(message);
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn describe_video(track: &RawTrack, warnings: &mut Vec<String>) -> VideoDescriptor {
    let codec = track
        .internet_media_type
        .as_deref()
        .and_then(|mime| mime.split_once('/').map(|(_, subtype)| subtype))
        .or(track.format.as_deref())
        .unwrap_or("?")
        .to_string();

    let profile = match (
        non_empty(track.format_profile.as_deref()),
        non_empty(track.format_level.as_deref()),
    ) {
        (Some(profile), Some(level)) => Some(format!("{}@L{}", profile, level)),
        _ => None,
    };

    let bitrate_bps = track.bit_rate_bps().or_else(|| {
        match (track.stream_size_bytes(), track.duration_secs()) {
            (Some(size), Some(duration)) if duration > 0.0 => Some(size * 8.0 / duration),
            _ => None,
        }
    });
    if bitrate_bps.is_none() {
        push_warning(warnings, "Couldn't get video bitrate".to_string());
    }

    VideoDescriptor {
        codec,
        profile,
        width: track.width.clone(),
        height: track.height.clone(),
        bitrate_bps,
        frame_rate: track.frame_rate_string.clone(),
    }
}

fn describe_audio(track: &RawTrack, warnings: &mut Vec<String>) -> AudioDescriptor {
    let label = track_label(track, warnings);

    let bitrate_bps = track.bit_rate_bps().or_else(|| {
        match (track.stream_size_bytes(), track.duration_secs()) {
            (Some(size), Some(duration)) if duration > 0.0 => Some(size * 8.0 / duration),
            _ => None,
        }
    });
    if bitrate_bps.is_none() {
        push_warning(
            warnings,
            format!("Couldn't get audio bitrate for {} track", label.language_name),
        );
    }

    AudioDescriptor {
        label,
        codec: audio_codec_label(track.format.as_deref().unwrap_or("?")).to_string(),
        channels: channel_layout(track.channels.as_deref()).to_string(),
        atmos: track
            .format_additional_features
            .as_deref()
            .is_some_and(|f| f.contains("JOC")),
        bitrate_kbps: bitrate_bps.map(|bps| (bps / 1000.0).round() as u64),
    }
}

fn track_label(track: &RawTrack, warnings: &mut Vec<String>) -> TrackLabel {
    let language = non_empty(track.language.as_deref()).map(str::to_string);
    let language_name = match &language {
        Some(tag) => language::display_name(tag),
        None => {
            push_warning(warnings, "One track has unknown language".to_string());
            "Und".to_string()
        }
    };

    let (title, flag) = split_title(track.title.as_deref());

    TrackLabel {
        language,
        language_name,
        title,
        flag,
    }
}

/// Split a track title into free text and a recognized flag.
///
/// "SDH" → (None, SDH); "Signs (Forced)" → ("Signs", Forced); "Commentary" → ("Commentary", None).
pub fn split_title(title: Option<&str>) -> (Option<String>, Option<TrackFlag>) {
    let Some(title) = non_empty(title) else {
        return (None, None);
    };

    if let Some(flag) = TrackFlag::from_tag(title) {
        return (None, Some(flag));
    }

    if let Some(caps) = FLAGGED_TITLE_RE.captures(title) {
        return (Some(caps[1].to_string()), TrackFlag::from_tag(&caps[2]));
    }

    (Some(title.to_string()), None)
}

impl TrackLabel {
    /// `**English** (Signs) [Forced]`
    pub fn render(&self) -> String {
        let mut out = format!("**{}**", self.language_name);
        if let Some(title) = &self.title {
            out.push_str(&format!(" ({})", title));
        }
        if let Some(flag) = self.flag {
            out.push_str(&format!(" [{}]", flag.as_str()));
        }
        out
    }
}

impl VideoDescriptor {
    /// `**HEVC Main 10@L5.1**, **1920x1080** @ **8450 kbps**, **23.976 FPS**`
    pub fn render(&self) -> String {
        let codec = match &self.profile {
            Some(profile) => format!("**{} {}**", self.codec, profile),
            None => format!("**{}**", self.codec),
        };

        let mut resolution = format!(
            "**{}x{}**",
            self.width.as_deref().unwrap_or("?"),
            self.height.as_deref().unwrap_or("?")
        );
        if let Some(bps) = self.bitrate_bps {
            resolution.push_str(&format!(" @ **{}**", format_video_bitrate(bps)));
        }

        let mut parts = vec![codec, resolution];
        if let Some(rate) = &self.frame_rate {
            parts.push(format!("**{}**", rate));
        }
        parts.join(", ")
    }
}

/// Bits per second as "N kbps" below 10 000 kbps, otherwise "N.NN Mbps".
pub fn format_video_bitrate(bps: f64) -> String {
    let kbps = bps / 1000.0;
    if kbps < 10_000.0 {
        format!("{:.0} kbps", kbps)
    } else {
        format!("{:.2} Mbps", bps / 1_000_000.0)
    }
}

impl AudioDescriptor {
    /// `**Japanese**, DDP5.1 Atmos @ 640 kbps`
    pub fn render(&self) -> String {
        let mut codec = format!("{}{}", self.codec, self.channels);
        if self.atmos {
            codec.push_str(" Atmos");
        }
        if let Some(kbps) = self.bitrate_kbps {
            codec.push_str(&format!(" @ {} kbps", kbps));
        }
        format!("{}, {}", self.label.render(), codec)
    }
}

impl SubtitleDescriptor {
    /// `**English** [SDH], SRT`
    pub fn render(&self) -> String {
        format!("{}, {}", self.label.render(), self.codec)
    }
}
