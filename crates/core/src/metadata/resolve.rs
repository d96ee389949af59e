use tracing::{info, warn};

use crate::retry::RetryPolicy;

use super::matching::info_url;
use super::types::{MetadataQuery, ResolvedMetadata};
use super::{MetadataResolver, ResolverError};

/// Resolve with retries. Any failure is logged and yields `None`.
///
/// An explicit link is kept as the information link; a searched entry
/// contributes its page URL without the title slug.
pub async fn resolve_metadata(
    resolver: &dyn MetadataResolver,
    query: &MetadataQuery,
    policy: &RetryPolicy,
) -> Option<ResolvedMetadata> {
    let outcome = policy
        .run(
            "metadata",
            |_| resolver.resolve(query),
            ResolverError::is_retryable,
        )
        .await;

    match outcome {
        Ok(Some(entry)) => {
            let info_url = match query {
                MetadataQuery::Link(link) => link.clone(),
                MetadataQuery::Name(_) => info_url(&entry.url),
            };
            info!(
                resolver = resolver.name(),
                title = %entry.title,
                info_url = %info_url,
                "Metadata resolved"
            );
            Some(ResolvedMetadata { entry, info_url })
        }
        Ok(None) => {
            warn!(resolver = resolver.name(), query = ?query, "No metadata found");
            None
        }
        Err(e) => {
            warn!(resolver = resolver.name(), error = %e, "Metadata lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockMetadataResolver};
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy::exponential(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_search_trims_slug() {
        let resolver = MockMetadataResolver::new(Some(fixtures::anime_entry()));
        let resolved = resolve_metadata(
            &resolver,
            &MetadataQuery::Name("Sousou no Frieren".to_string()),
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(resolved.info_url, "https://myanimelist.net/anime/52991/");
    }

    #[tokio::test]
    async fn test_link_kept_verbatim() {
        let resolver = MockMetadataResolver::new(Some(fixtures::anime_entry()));
        let link = "https://myanimelist.net/anime/52991/Sousou_no_Frieren";
        let resolved = resolve_metadata(&resolver, &MetadataQuery::Link(link.to_string()), &policy())
            .await
            .unwrap();
        assert_eq!(resolved.info_url, link);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let resolver = MockMetadataResolver::new(Some(fixtures::anime_entry()));
        resolver.set_failures(2).await;
        let resolved = resolve_metadata(
            &resolver,
            &MetadataQuery::Name("Frieren".to_string()),
            &policy(),
        )
        .await;
        assert!(resolved.is_some());
        assert_eq!(resolver.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_gives_up_gracefully() {
        let resolver = MockMetadataResolver::new(Some(fixtures::anime_entry()));
        resolver.set_failures(10).await;
        let resolved = resolve_metadata(
            &resolver,
            &MetadataQuery::Name("Frieren".to_string()),
            &policy(),
        )
        .await;
        assert!(resolved.is_none());
        assert_eq!(resolver.call_count().await, 3);
    }
}
