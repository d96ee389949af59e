//! Testing utilities and mock implementations.
//!
//! Every external tool and service the release pipeline talks to sits
//! behind a trait; the mocks here implement those traits in memory so
//! jobs can run end to end without mediainfo, ffmpeg or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use seedpost_core::testing::{fixtures, MockMediaProbe, MockProviderApi};
//!
//! let probe = MockMediaProbe::new(fixtures::media_report(&["en", "ja"], &["en"]));
//! let api = MockProviderApi::new();
//!
//! // Configure mock responses
//! api.set_session_valid(true).await;
//! api.fail_submissions_for("nyaa", "banned").await;
//! ```

mod mock_frame_extractor;
mod mock_image_host;
mod mock_media_probe;
mod mock_metadata_resolver;
mod mock_notifier;
mod mock_paste_service;
mod mock_provider_api;
mod mock_torrent_backend;

pub use mock_frame_extractor::MockFrameExtractor;
pub use mock_image_host::MockImageHost;
pub use mock_media_probe::MockMediaProbe;
pub use mock_metadata_resolver::MockMetadataResolver;
pub use mock_notifier::MockNotifier;
pub use mock_paste_service::MockPasteService;
pub use mock_provider_api::{MockProviderApi, RecordedEdit, RecordedSubmission};
pub use mock_torrent_backend::MockTorrentBackend;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Credentials;
    use crate::media::{describe_tracks, MediaReport, RawTrack, TrackSummary};
    use crate::metadata::AnimeEntry;
    use crate::upload::Provider;

    fn track(track_type: &str, fields: &[(&str, &str)]) -> RawTrack {
        let mut t = RawTrack::new(track_type);
        for (key, value) in fields {
            let value = Some(value.to_string());
            match *key {
                "Language" => t.language = value,
                "Title" => t.title = value,
                "Format" => t.format = value,
                "Format_Profile" => t.format_profile = value,
                "Format_Level" => t.format_level = value,
                "BitRate" => t.bit_rate = value,
                "StreamSize" => t.stream_size = value,
                "Duration" => t.duration = value,
                "Duration_String3" => t.duration_string3 = value,
                "Width" => t.width = value,
                "Height" => t.height = value,
                "FrameRate_String" => t.frame_rate_string = value,
                "Channels" => t.channels = value,
                "MenuCount" => t.menu_count = value,
                _ => {}
            }
        }
        t
    }

    /// A complete probe report: a 23:40 HEVC episode with chapters, one
    /// E-AC-3 track per audio language and one SRT track per subtitle
    /// language.
    pub fn media_report(audio_langs: &[&str], subtitle_langs: &[&str]) -> MediaReport {
        let mut tracks = vec![
            track(
                "General",
                &[
                    ("Duration", "1420.500"),
                    ("Duration_String3", "00:23:40.500"),
                    ("BitRate", "9000000"),
                    ("MenuCount", "1"),
                ],
            ),
            track(
                "Video",
                &[
                    ("Format", "HEVC"),
                    ("Format_Profile", "Main 10"),
                    ("Format_Level", "5.1"),
                    ("BitRate", "8000000"),
                    ("Duration", "1420.500"),
                    ("Width", "1920"),
                    ("Height", "1080"),
                    ("FrameRate_String", "23.976 FPS"),
                ],
            ),
        ];
        tracks.extend(audio_langs.iter().map(|lang| {
            track(
                "Audio",
                &[
                    ("Language", lang),
                    ("Format", "E-AC-3"),
                    ("Channels", "6"),
                    ("BitRate", "640000"),
                ],
            )
        }));
        tracks.extend(
            subtitle_langs
                .iter()
                .map(|lang| track("Text", &[("Language", lang), ("Format", "UTF-8")])),
        );
        MediaReport::new(tracks)
    }

    /// English and Japanese audio, English subtitles, chapters, and the
    /// given container duration in seconds.
    pub fn track_summary(duration_secs: f64) -> TrackSummary {
        let mut summary = describe_tracks(&media_report(&["en", "ja"], &["en"]))
            .expect("fixture report is valid");
        summary.duration_secs = Some(duration_secs);
        summary
    }

    /// Sousou no Frieren as returned by the catalog.
    pub fn anime_entry() -> AnimeEntry {
        AnimeEntry {
            id: 52991,
            url: "https://myanimelist.net/anime/52991/Sousou_no_Frieren".to_string(),
            title: "Sousou no Frieren".to_string(),
            title_english: Some("Frieren: Beyond Journey's End".to_string()),
            synonyms: vec!["Frieren at the Funeral".to_string()],
        }
    }

    /// A provider at `https://{name}.example` without session cookies.
    pub fn provider(name: &str) -> Provider {
        Provider {
            name: name.to_string(),
            domain: format!("https://{}.example", name),
            proxy: None,
            credentials: Credentials {
                username: "uploader".to_string(),
                password: "secret".to_string(),
            },
            announces: vec![format!("http://{}.example/announce", name)],
            cookies: None,
        }
    }
}
