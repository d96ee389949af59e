//! Provider category table.
//!
//! Every category has a short numeric code used on the command line, the
//! provider's own identifier and a human label. Lookups accept any of the three.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown category: '{0}' (run `seedpost categories` for the list)")]
pub struct UnknownCategory(pub String);

/// Upload category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AnimeEnglish,
    AnimeNonEnglish,
    AnimeRaw,
    LiveActionEnglish,
    LiveActionNonEnglish,
    LiveActionRaw,
    AnimeMusicVideo,
}

impl Category {
    /// All categories in numeric-code order.
    pub const ALL: [Category; 7] = [
        Category::AnimeEnglish,
        Category::AnimeNonEnglish,
        Category::AnimeRaw,
        Category::LiveActionEnglish,
        Category::LiveActionNonEnglish,
        Category::LiveActionRaw,
        Category::AnimeMusicVideo,
    ];

    /// Short code used on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AnimeEnglish => "1",
            Self::AnimeNonEnglish => "2",
            Self::AnimeRaw => "3",
            Self::LiveActionEnglish => "4",
            Self::LiveActionNonEnglish => "5",
            Self::LiveActionRaw => "6",
            Self::AnimeMusicVideo => "7",
        }
    }

    /// Identifier sent to the provider.
    pub fn provider_id(&self) -> &'static str {
        match self {
            Self::AnimeEnglish => "1_2",
            Self::AnimeNonEnglish => "1_3",
            Self::AnimeRaw => "1_4",
            Self::LiveActionEnglish => "4_1",
            Self::LiveActionNonEnglish => "4_3",
            Self::LiveActionRaw => "4_4",
            Self::AnimeMusicVideo => "1_1",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AnimeEnglish => "Anime - English-translated",
            Self::AnimeNonEnglish => "Anime - Non-English-translated",
            Self::AnimeRaw => "Anime - Raw",
            Self::LiveActionEnglish => "Live Action - English-translated",
            Self::LiveActionNonEnglish => "Live Action - Non-English-translated",
            Self::LiveActionRaw => "Live Action - Raw",
            Self::AnimeMusicVideo => "Anime - Anime Music Video",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn from_provider_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.provider_id() == id)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Metadata lookups only apply to anime categories.
    pub fn is_anime(&self) -> bool {
        self.provider_id().starts_with("1_")
    }

    /// Anime translated to a language other than English, or untranslated.
    pub fn is_non_english(&self) -> bool {
        matches!(self, Self::AnimeNonEnglish | Self::AnimeRaw)
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_code(s)
            .or_else(|| Self::from_provider_id(s))
            .or_else(|| Self::from_label(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
