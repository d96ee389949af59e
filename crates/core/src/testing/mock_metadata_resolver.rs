//! Mock metadata resolver for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{AnimeEntry, MetadataQuery, MetadataResolver, ResolverError};

/// Mock implementation of the MetadataResolver trait.
///
/// Answers every query with the configured entry after the configured
/// number of retryable failures.
#[derive(Debug, Clone)]
pub struct MockMetadataResolver {
    entry: Option<AnimeEntry>,
    failures: Arc<RwLock<u32>>,
    queries: Arc<RwLock<Vec<MetadataQuery>>>,
}

impl MockMetadataResolver {
    pub fn new(entry: Option<AnimeEntry>) -> Self {
        Self {
            entry,
            failures: Arc::new(RwLock::new(0)),
            queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fail the next `count` lookups with a request error.
    pub async fn set_failures(&self, count: u32) {
        *self.failures.write().await = count;
    }

    pub async fn call_count(&self) -> usize {
        self.queries.read().await.len()
    }

    pub async fn queries(&self) -> Vec<MetadataQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl MetadataResolver for MockMetadataResolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, query: &MetadataQuery) -> Result<Option<AnimeEntry>, ResolverError> {
        self.queries.write().await.push(query.clone());

        let mut failures = self.failures.write().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(ResolverError::Request("connection reset".to_string()));
        }
        Ok(self.entry.clone())
    }
}
