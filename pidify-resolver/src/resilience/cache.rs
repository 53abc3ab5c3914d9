//! TTL-bounded lookup cache
//!
//! Keyed by (source, normalized query). Shared across all field tasks of one
//! run, read-mostly. Only complete successful responses are ever inserted;
//! a run never caches partial data.

use crate::models::RegistrySource;
use crate::registries::RawCandidate;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry {
    candidates: Vec<RawCandidate>,
    fetched_at: Instant,
}

/// Shared, TTL-bounded candidate cache.
///
/// Constructed at run start and dropped at run end; exposed only through the
/// resilience layer, never directly to matcher or policy.
pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<(RegistrySource, String), CacheEntry>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a live entry. Expired entries count as absent.
    pub async fn get(&self, source: RegistrySource, key: &str) -> Option<Vec<RawCandidate>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&(source, key.to_string()))?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.candidates.clone())
    }

    /// Store a complete successful response, evicting any expired entries.
    pub async fn insert(&self, source: RegistrySource, key: String, candidates: Vec<RawCandidate>) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        entries.insert(
            (source, key),
            CacheEntry {
                candidates,
                fetched_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str) -> RawCandidate {
        RawCandidate {
            identifier: id.to_string(),
            display_label: "Example".to_string(),
            alt_labels: vec![],
            payload: json!({}),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl() {
        let cache = QueryCache::new(Duration::from_secs(900));
        cache
            .insert(RegistrySource::Person, "jane smith".to_string(), vec![candidate("a")])
            .await;

        tokio::time::advance(Duration::from_secs(899)).await;
        let hit = cache.get(RegistrySource::Person, "jane smith").await;
        assert_eq!(hit.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn miss_after_ttl() {
        let cache = QueryCache::new(Duration::from_secs(900));
        cache
            .insert(RegistrySource::Person, "jane smith".to_string(), vec![candidate("a")])
            .await;

        tokio::time::advance(Duration::from_secs(901)).await;
        assert!(cache.get(RegistrySource::Person, "jane smith").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_scoped_by_source() {
        let cache = QueryCache::new(Duration::from_secs(900));
        cache
            .insert(RegistrySource::Person, "example".to_string(), vec![candidate("a")])
            .await;

        assert!(cache.get(RegistrySource::Organization, "example").await.is_none());
        assert!(cache.get(RegistrySource::Person, "example").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn insert_evicts_expired_entries() {
        let cache = QueryCache::new(Duration::from_secs(10));
        cache
            .insert(RegistrySource::Person, "old".to_string(), vec![candidate("a")])
            .await;

        tokio::time::advance(Duration::from_secs(11)).await;
        cache
            .insert(RegistrySource::Person, "new".to_string(), vec![candidate("b")])
            .await;

        assert_eq!(cache.len().await, 1);
    }
}
