use serde::{Deserialize, Serialize};

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataQuery {
    /// A catalog page URL given by the user.
    Link(String),
    /// A search name derived from the release name.
    Name(String),
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeEntry {
    #[serde(rename = "mal_id")]
    pub id: u64,
    /// Catalog page, including the trailing title slug.
    pub url: String,
    /// Main (romanized) title.
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default, rename = "title_synonyms")]
    pub synonyms: Vec<String>,
}

/// The outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub entry: AnimeEntry,
    /// Information link sent with the upload.
    pub info_url: String,
}
