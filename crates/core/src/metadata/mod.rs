//! Anime metadata lookup.
//!
//! A [`MetadataResolver`] maps an explicit catalog link or a name derived
//! from the release to a catalog entry. The job runner uses the entry for
//! the information link and an extra display-name tag. Lookups never abort
//! a job: [`resolve_metadata`] retries and then gives up with a warning.

mod jikan;
mod matching;
mod resolve;
mod types;

pub use jikan::JikanResolver;
pub use matching::{
    best_match, extract_search_name, info_url, link_id, select_title, similarity_ratio,
    MATCH_THRESHOLD,
};
pub use resolve::resolve_metadata;
pub use types::{AnimeEntry, MetadataQuery, ResolvedMetadata};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The explicit link does not carry a catalog id.
    #[error("Invalid catalog link: {0}")]
    InvalidLink(String),
}

impl ResolverError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::InvalidLink(_) => false,
        }
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

/// Catalog lookup used to enrich a release.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the matching entry, or `None` when nothing was found.
    async fn resolve(&self, query: &MetadataQuery) -> Result<Option<AnimeEntry>, ResolverError>;
}
