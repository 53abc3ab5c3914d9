//! Resilience layer wrapping every registry call
//!
//! Rate limiting, retry/backoff, and result caching around the registry
//! clients. Cache hits bypass the rate limiter; each retry attempt consumes
//! its own rate-limit token since each is a real outbound call. State here is
//! scoped to one orchestrator run, never process-global, so runs stay
//! isolated and testable.

use crate::models::RegistrySource;
use crate::registries::{QueryError, RawCandidate, RegistryClient, SearchQuery};
use pidify_common::config::RetryConfig;
use std::num::NonZeroU32;
use std::sync::Arc;

pub mod cache;
pub mod retry;

pub use cache::QueryCache;

type DirectLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Resilience-wrapped handle to one registry client.
///
/// The limiter is per-source and shared across every field task targeting
/// that source (one gateway per source per run); the cache is shared across
/// all gateways of the run.
pub struct RegistryGateway {
    client: Arc<dyn RegistryClient>,
    cache: Arc<QueryCache>,
    limiter: DirectLimiter,
    retry: RetryConfig,
}

impl RegistryGateway {
    pub fn new(
        client: Arc<dyn RegistryClient>,
        cache: Arc<QueryCache>,
        rate_per_sec: u32,
        retry: RetryConfig,
    ) -> Self {
        // Safe: config validation rejects zero rates
        let quota = governor::Quota::per_second(NonZeroU32::new(rate_per_sec.max(1)).unwrap());

        Self {
            client,
            cache,
            limiter: governor::RateLimiter::direct(quota),
            retry,
        }
    }

    pub fn source(&self) -> RegistrySource {
        self.client.source()
    }

    /// Fetch candidates for a query: cache, then rate-limited retried search.
    ///
    /// Only complete successful responses enter the cache; failures and
    /// partial data are discarded.
    pub async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError> {
        let source = self.client.source();
        let key = query.cache_key();

        if let Some(hit) = self.cache.get(source, &key).await {
            tracing::debug!(source = source.as_str(), key = %key, "Lookup cache hit");
            return Ok(hit);
        }

        let operation_name = format!("{} search", source.as_str());
        let candidates = retry::retry_with_backoff(&operation_name, &self.retry, || async move {
            self.limiter.until_ready().await;
            self.client.search(query).await
        })
        .await?;

        tracing::debug!(
            source = source.as_str(),
            key = %key,
            candidates = candidates.len(),
            "Registry search complete"
        );

        self.cache.insert(source, key, candidates.clone()).await;
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingClient {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl RegistryClient for CountingClient {
        fn source(&self) -> RegistrySource {
            RegistrySource::Person
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<RawCandidate>, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QueryError::Network("unreachable".to_string()));
            }
            Ok(vec![RawCandidate {
                identifier: "0000-0002-1825-0097".to_string(),
                display_label: "Jane Smith".to_string(),
                alt_labels: vec![],
                payload: json!({}),
            }])
        }
    }

    fn gateway(client: Arc<CountingClient>, ttl_secs: u64) -> RegistryGateway {
        RegistryGateway::new(
            client,
            Arc::new(QueryCache::new(Duration::from_secs(ttl_secs))),
            50,
            RetryConfig {
                max_attempts: 3,
                initial_backoff_ms: 10,
                max_backoff_ms: 100,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_query_hits_cache() {
        let client = Arc::new(CountingClient {
            calls: AtomicU32::new(0),
            fail: false,
        });
        let gateway = gateway(client.clone(), 900);
        let query = SearchQuery::new("jane smith");

        let first = gateway.fetch(&query).await.unwrap();
        let second = gateway.fetch(&query).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        // Second fetch served from cache, no client call
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_refetches() {
        let client = Arc::new(CountingClient {
            calls: AtomicU32::new(0),
            fail: false,
        });
        let gateway = gateway(client.clone(), 10);
        let query = SearchQuery::new("jane smith");

        gateway.fetch(&query).await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        gateway.fetch(&query).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let client = Arc::new(CountingClient {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let gateway = gateway(client.clone(), 900);
        let query = SearchQuery::new("jane smith");

        assert!(gateway.fetch(&query).await.is_err());
        // Full retry budget consumed
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);

        assert!(gateway.fetch(&query).await.is_err());
        // A failed result was not cached: a fresh fetch retries again
        assert_eq!(client.calls.load(Ordering::SeqCst), 6);
    }
}
