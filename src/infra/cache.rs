//! In-memory TTL cache for autocomplete results.

use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

/// Distinct queries kept per cache; the oldest entry is evicted beyond this.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub status: CacheStatus,
}

struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        (self.fetched_at.elapsed() <= ttl).then(|| CachedPayload {
            data: self.value.clone(),
            status: CacheStatus::Cached,
        })
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload {
            data: self.value.clone(),
            status: CacheStatus::Stale,
        }
    }
}

/// Results keyed by the normalized query text.
pub struct LookupCache<T> {
    entries: HashMap<String, Cached<T>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Clone> LookupCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn fresh(&self, query: &str) -> Option<CachedPayload<T>> {
        self.entries
            .get(&cache_key(query))
            .and_then(|entry| entry.if_fresh(self.ttl))
    }

    /// Last known value regardless of age, used when the API is unreachable.
    pub fn stale(&self, query: &str) -> Option<CachedPayload<T>> {
        self.entries.get(&cache_key(query)).map(Cached::stale)
    }

    pub fn store(&mut self, query: &str, value: T) -> CachedPayload<T> {
        let payload = CachedPayload {
            data: value.clone(),
            status: CacheStatus::Fresh,
        };
        let key = cache_key(query);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            Cached {
                value,
                fetched_at: Instant::now(),
            },
        );
        payload
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.fetched_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let mut cache = LookupCache::new(Duration::from_secs(60));
        cache.store("Paris", vec!["CDG", "ORY"]);

        let hit = cache.fresh("  paris ").unwrap();
        assert_eq!(hit.status, CacheStatus::Cached);
        assert_eq!(hit.data, vec!["CDG", "ORY"]);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.fresh("paris").is_none());
        assert_eq!(cache.stale("PARIS").unwrap().status, CacheStatus::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn oldest_query_is_evicted_at_capacity() {
        let mut cache = LookupCache::with_capacity(Duration::from_secs(60), 2);
        cache.store("p", 1);
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.store("pa", 2);
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.store("pa", 3);
        assert_eq!(cache.len(), 2);

        cache.store("par", 4);
        assert_eq!(cache.len(), 2);
        assert!(cache.stale("p").is_none());
        assert_eq!(cache.fresh("pa").unwrap().data, 3);
        assert_eq!(cache.fresh("par").unwrap().data, 4);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = LookupCache::new(Duration::from_secs(60));
        cache.store("eur", 1);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
