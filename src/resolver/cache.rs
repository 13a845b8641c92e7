//! TTL cache of resolved hashes
//!
//! Entries expire purely by age, checked at read time; nothing runs in the
//! background. The map sits behind a single mutex that covers both the TTL-aware
//! read and the write.
//!
//! By default the cache is bounded only by TTL. With `max_entries` set, an insert
//! that would overflow first drops expired entries and then evicts the oldest one.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::torrent::is_valid_info_hash;

/// A resolved hash and when it was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedHash {
    pub hash: String,
    pub resolved_at: Instant,
}

impl CachedHash {
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.resolved_at) < ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub ttl_secs: u64,
    pub max_entries: Option<usize>,
}

/// URL → hash cache shared by all callers of one resolver
#[derive(Debug)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CachedHash>>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: None,
        }
    }

    /// Bound the number of entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh hash for `url`, if any
    pub async fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(url)
            .filter(|entry| entry.is_fresh(self.ttl, Instant::now()))
            .map(|entry| entry.hash.clone())
    }

    /// Record `hash` for `url`, replacing any previous entry
    pub async fn insert(&self, url: &str, hash: &str) {
        self.insert_at(url, hash, Instant::now()).await;
    }

    pub(crate) async fn insert_at(&self, url: &str, hash: &str, resolved_at: Instant) {
        if !is_valid_info_hash(hash) {
            warn!("Refusing to cache malformed hash {:?} for {}", hash, url);
            return;
        }

        let mut entries = self.entries.lock().await;
        if let Some(max) = self.max_entries {
            if !entries.contains_key(url) && entries.len() >= max {
                Self::make_room(&mut entries, self.ttl, max);
            }
        }

        trace!("Caching {} -> {}", url, hash);
        entries.insert(
            url.to_string(),
            CachedHash {
                hash: hash.to_string(),
                resolved_at,
            },
        );
    }

    fn make_room(entries: &mut HashMap<String, CachedHash>, ttl: Duration, max: usize) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_fresh(ttl, now));

        while entries.len() >= max {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.resolved_at)
                .map(|(url, _)| url.clone());
            match oldest {
                Some(url) => {
                    trace!("Evicting oldest cache entry {}", url);
                    entries.remove(&url);
                }
                None => break,
            }
        }
    }

    /// Drop every expired entry
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len().await,
            ttl_secs: self.ttl.as_secs(),
            max_entries: self.max_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn hours_ago(hours: u64) -> Instant {
        Instant::now()
            .checked_sub(Duration::from_secs(hours * 3600))
            .unwrap_or_else(Instant::now)
    }

    #[tokio::test]
    async fn test_get_fresh_entry() {
        let cache = ResolutionCache::new(Duration::from_secs(3600));
        cache.insert("u1", &hash('a')).await;
        assert_eq!(cache.get("u1").await, Some(hash('a')));
        assert_eq!(cache.get("u2").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = ResolutionCache::new(Duration::from_secs(1));
        let stale = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        cache.insert_at("u1", &hash('a'), stale).await;

        assert_eq!(cache.get("u1").await, None);
        // Expiry happens at read time only; the entry is still stored
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let cache = ResolutionCache::new(Duration::ZERO);
        cache.insert("u1", &hash('a')).await;
        assert_eq!(cache.get("u1").await, None);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let cache = ResolutionCache::new(Duration::from_secs(3600));
        cache.insert("u1", &hash('a')).await;
        cache.insert("u1", &hash('b')).await;
        assert_eq!(cache.get("u1").await, Some(hash('b')));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_malformed_hash_not_cached() {
        let cache = ResolutionCache::new(Duration::from_secs(3600));
        cache.insert("u1", "").await;
        cache.insert("u2", "ABC").await;
        cache.insert("u3", &"A".repeat(40)).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = ResolutionCache::new(Duration::from_secs(1));
        let stale = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        cache.insert_at("old", &hash('a'), stale).await;
        cache.insert("new", &hash('b')).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("new").await, Some(hash('b')));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let cache = ResolutionCache::new(Duration::from_secs(3600));
        cache.insert("u1", &hash('a')).await;
        cache.insert("u2", &hash('b')).await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 2);
        assert_eq!(stats.ttl_secs, 3600);
        assert_eq!(stats.max_entries, None);

        cache.clear().await;
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_bounded_cache_evicts_oldest() {
        let cache = ResolutionCache::new(Duration::from_secs(3600 * 24)).with_max_entries(2);
        cache.insert_at("oldest", &hash('a'), hours_ago(3)).await;
        cache.insert_at("older", &hash('b'), hours_ago(2)).await;
        cache.insert("newest", &hash('c')).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("oldest").await, None);
        assert_eq!(cache.get("older").await, Some(hash('b')));
        assert_eq!(cache.get("newest").await, Some(hash('c')));
    }

    #[tokio::test]
    async fn test_bounded_cache_drops_expired_first() {
        let cache = ResolutionCache::new(Duration::from_secs(1)).with_max_entries(3);
        let stale = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        cache.insert_at("stale1", &hash('a'), stale).await;
        cache.insert_at("stale2", &hash('b'), stale).await;
        cache.insert("fresh", &hash('c')).await;
        cache.insert("another", &hash('d')).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("fresh").await, Some(hash('c')));
        assert_eq!(cache.get("another").await, Some(hash('d')));
    }

    #[tokio::test]
    async fn test_bounded_cache_overwrite_does_not_evict() {
        let cache = ResolutionCache::new(Duration::from_secs(3600)).with_max_entries(2);
        cache.insert("u1", &hash('a')).await;
        cache.insert("u2", &hash('b')).await;
        cache.insert("u1", &hash('c')).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("u2").await, Some(hash('b')));
    }
}
