//! Jikan (unofficial MyAnimeList API) client.
//!
//! Jikan is rate limited to a few requests per second; 429 answers are
//! reported as [`ResolverError::RateLimited`] so the caller can back off.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::MetadataConfig;

use super::matching::{best_match, link_id};
use super::types::{AnimeEntry, MetadataQuery};
use super::{MetadataResolver, ResolverError};

const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Jikan v4 resolver.
pub struct JikanResolver {
    client: Client,
    base_url: String,
}

impl JikanResolver {
    pub fn new(config: &MetadataConfig) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get an entry by catalog id.
    pub async fn get_anime(&self, id: u64) -> Result<Option<AnimeEntry>, ResolverError> {
        let url = format!("{}/anime/{}", self.base_url, id);
        debug!("Jikan lookup: id={}", id);

        let response = self.client.get(&url).send().await?;
        if response.status() == 404 {
            return Ok(None);
        }
        let envelope: Envelope<AnimeEntry> = Self::parse(response).await?;
        Ok(Some(envelope.data))
    }

    /// Search entries by name, best ranked first.
    pub async fn search_anime(&self, query: &str) -> Result<Vec<AnimeEntry>, ResolverError> {
        let url = format!("{}/anime", self.base_url);
        debug!("Jikan search: query='{}'", query);

        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await?;
        let envelope: Envelope<Vec<AnimeEntry>> = Self::parse(response).await?;

        let mut results = envelope.data;
        results.truncate(SEARCH_LIMIT);
        Ok(results)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ResolverError> {
        let status = response.status();
        if status == 429 {
            return Err(ResolverError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ResolverError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataResolver for JikanResolver {
    fn name(&self) -> &str {
        "jikan"
    }

    async fn resolve(&self, query: &MetadataQuery) -> Result<Option<AnimeEntry>, ResolverError> {
        match query {
            MetadataQuery::Link(link) => {
                let id = link_id(link).ok_or_else(|| ResolverError::InvalidLink(link.clone()))?;
                self.get_anime(id).await
            }
            MetadataQuery::Name(name) => {
                let results = self.search_anime(name).await?;
                Ok(best_match(name, &results).cloned())
            }
        }
    }
}
