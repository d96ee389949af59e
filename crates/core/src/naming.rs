//! Display names and title tags.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static CHANNEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]{3}[257]) ([01])").unwrap());

/// Tag selection for the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOptions {
    pub uncensored: bool,
    pub multi_subs: bool,
    pub dual_audio: bool,
    pub multi_audio: bool,
    /// Derive audio and subtitle tags from the track counts.
    pub auto: bool,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            uncensored: false,
            multi_subs: false,
            dual_audio: false,
            multi_audio: false,
            auto: true,
        }
    }
}

/// Tags in display order: catalog title, audio, subtitles, Uncensored.
///
/// With `auto`, two audio languages give Dual-Audio, more give Multi-Audio,
/// and more than one subtitle language gives Multi-Subs. Manual flags are
/// always honored; Dual-Audio wins over Multi-Audio.
pub fn release_tags(
    title: Option<String>,
    options: &TagOptions,
    audio_count: usize,
    subtitle_count: usize,
) -> Vec<String> {
    let dual = options.dual_audio || (options.auto && audio_count == 2);
    let multi = options.multi_audio || (options.auto && audio_count > 2);
    let multi_subs = options.multi_subs || (options.auto && subtitle_count > 1);

    let mut tags: Vec<String> = title.into_iter().collect();
    if dual {
        tags.push("Dual-Audio".to_string());
    } else if multi {
        tags.push("Multi-Audio".to_string());
    }
    if multi_subs {
        tags.push("Multi-Subs".to_string());
    }
    if options.uncensored {
        tags.push("Uncensored".to_string());
    }
    tags
}

/// `Show.S01E01.DDP5.1` + tags → `Show S01E01 DDP5.1 (tag, tag)`.
pub fn format_display_name(release_name: &str, tags: &[String]) -> String {
    let spaced = release_name.replace('.', " ");
    let name = CHANNEL_RE.replace_all(&spaced, "$1.$2");

    if tags.is_empty() {
        name.into_owned()
    } else {
        format!("{} ({})", name, tags.join(", "))
    }
}
