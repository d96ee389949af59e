//! Release description text.

use crate::media::TrackSummary;

const SEPARATOR: &str = "\n\n---\n\n";
const LIST_JOIN: &str = " │ ";

/// Inputs of the description besides the tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionOptions {
    /// Quoted at the top.
    pub note: Option<String>,
    pub advert: Option<String>,
    /// Count raw tracks instead of distinct languages.
    pub real_length: bool,
    /// Link to the full media report.
    pub media_report_url: Option<String>,
}

/// Markdown description: note, advert, tech specs and the media report link.
pub fn build_description(tracks: &TrackSummary, options: &DescriptionOptions) -> String {
    let mut out = String::new();

    if let Some(note) = options.note.as_deref().filter(|n| !n.is_empty()) {
        out.push('>');
        out.push_str(note);
        out.push_str(SEPARATOR);
    }
    if let Some(advert) = options.advert.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(advert);
        out.push_str(SEPARATOR);
    }

    out.push_str(&tech_specs(tracks, options.real_length));

    if let Some(url) = &options.media_report_url {
        out.push_str(&format!("\n[Full MediaInfo]({})", url));
    }
    out
}

/// The `Tech Specs:` block.
pub fn tech_specs(tracks: &TrackSummary, real_length: bool) -> String {
    let audio: Vec<String> = tracks.audio.iter().map(|a| a.render()).collect();
    let subtitles: Vec<String> = tracks.subtitles.iter().map(|s| s.render()).collect();
    let subtitles = if subtitles.is_empty() {
        "**N/A**".to_string()
    } else {
        subtitles.join(LIST_JOIN)
    };

    format!(
        "`Tech Specs:`\n\
         * `Video:` {}\n\
         * `Audios ({}):` {}\n\
         * `Subtitles ({}):` {}\n\
         * `Chapters:` **{}**\n\
         * `Duration:` **~{}**\n",
        tracks.video.render(),
        tracks.audio_count(real_length),
        audio.join(LIST_JOIN),
        tracks.subtitle_count(real_length),
        subtitles,
        if tracks.has_chapters { "Yes" } else { "No" },
        tracks.duration_display.as_deref().unwrap_or("?"),
    )
}
