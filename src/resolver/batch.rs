//! Batch hash resolver
//!
//! For every URL, in order of cost:
//! 1. a fresh cache entry,
//! 2. fast-path extraction from the URL itself (magnet or hash-bearing path),
//! 3. downloading the `.torrent` file, for URLs that look like one.
//!
//! Slow-path downloads run concurrently with at most `max_workers` in flight.
//! Each download is capped by `fetch_timeout` and the whole fan-out by
//! `batch_timeout`. A URL that cannot be resolved is simply absent from the
//! result; nothing here returns an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::feed::FeedItem;
use crate::resolver::cache::{CacheStats, ResolutionCache};
use crate::torrent::{
    extract_hash_from_url, is_valid_info_hash, looks_like_torrent_url, HttpTorrentFetcher,
    TorrentSource,
};

/// Resolver tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// How long a resolved hash stays valid
    pub cache_ttl: Duration,
    /// Maximum concurrent torrent downloads
    pub max_workers: usize,
    /// Cap on a single torrent download
    pub fetch_timeout: Duration,
    /// Cap on the whole slow-path fan-out of one batch
    pub batch_timeout: Duration,
    /// Optional bound on cache size
    pub cache_max_entries: Option<usize>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            max_workers: 10,
            fetch_timeout: Duration::from_secs(10),
            batch_timeout: Duration::from_secs(30),
            cache_max_entries: None,
        }
    }
}

/// Counters for one batch, logged when it finishes
#[derive(Debug, Default)]
struct BatchSummary {
    requested: usize,
    cached: usize,
    fast: usize,
    fetched: usize,
    unresolved: usize,
}

/// Resolves info-hashes for batches of URLs
pub struct HashResolver {
    source: Arc<dyn TorrentSource>,
    cache: ResolutionCache,
    options: ResolverOptions,
}

impl HashResolver {
    pub fn new(source: Arc<dyn TorrentSource>, options: ResolverOptions) -> Self {
        let mut cache = ResolutionCache::new(options.cache_ttl);
        if let Some(max) = options.cache_max_entries {
            cache = cache.with_max_entries(max);
        }

        Self {
            source,
            cache,
            options,
        }
    }

    /// Resolver backed by an [`HttpTorrentFetcher`] using `options.fetch_timeout`
    pub fn with_http(options: ResolverOptions) -> Result<Self> {
        let fetcher = HttpTorrentFetcher::new(options.fetch_timeout)?;
        Ok(Self::new(Arc::new(fetcher), options))
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve hashes for `urls`
    ///
    /// Returns a map from each resolved URL to its lowercase hex hash. Empty URLs
    /// are ignored and duplicates are resolved once. With `skip_slow_fetch`, no
    /// torrent file is downloaded.
    pub async fn batch_extract<I, S>(&self, urls: I, skip_slow_fetch: bool) -> HashMap<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = HashMap::new();
        let mut summary = BatchSummary::default();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for url in urls {
            let url = url.as_ref();
            if url.trim().is_empty() || !seen.insert(url.to_string()) {
                continue;
            }
            summary.requested += 1;

            if let Some(hash) = self.cache.get(url).await {
                summary.cached += 1;
                results.insert(url.to_string(), hash);
                continue;
            }

            let hash = extract_hash_from_url(url);
            if !hash.is_empty() {
                summary.fast += 1;
                self.cache.insert(url, &hash).await;
                results.insert(url.to_string(), hash);
                continue;
            }

            if !skip_slow_fetch && looks_like_torrent_url(url) {
                pending.push(url.to_string());
            } else {
                debug!("No cheap hash for {}", url);
                summary.unresolved += 1;
            }
        }

        if !pending.is_empty() {
            let attempted = pending.len();
            for (url, hash) in self.fetch_all(pending).await {
                self.cache.insert(&url, &hash).await;
                results.insert(url, hash);
                summary.fetched += 1;
            }
            summary.unresolved += attempted - summary.fetched;
        }

        info!(
            "Resolved {}/{} URLs ({} cached, {} fast path, {} downloaded, {} unresolved)",
            results.len(),
            summary.requested,
            summary.cached,
            summary.fast,
            summary.fetched,
            summary.unresolved
        );
        results
    }

    /// Resolve hashes for feed items that do not already carry one
    ///
    /// Keys of the returned map are each item's effective URL.
    pub async fn batch_extract_hashes(&self, items: &[FeedItem], skip_slow_fetch: bool) -> HashMap<String, String> {
        let urls: Vec<&str> = items
            .iter()
            .filter(|item| !item.has_hash())
            .map(FeedItem::effective_url)
            .filter(|url| !url.is_empty())
            .collect();

        debug!("{} of {} items need hash resolution", urls.len(), items.len());
        self.batch_extract(urls, skip_slow_fetch).await
    }

    /// Return `hash` if it is a proper info-hash, otherwise try to resolve one
    /// from `torrent_url`
    ///
    /// Falls back to `hash` unchanged when nothing better is found.
    pub async fn ensure_valid_hash(&self, hash: &str, torrent_url: &str) -> String {
        if is_valid_info_hash(hash) {
            return hash.to_string();
        }

        let torrent_url = torrent_url.trim();
        if torrent_url.is_empty() {
            return hash.to_string();
        }

        let resolved = self.batch_extract([torrent_url], false).await;
        match resolved.get(torrent_url) {
            Some(found) => {
                debug!("Replaced hash {:?} with {} from {}", hash, found, torrent_url);
                found.clone()
            }
            None => hash.to_string(),
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Hash cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Download every pending URL, bounded by `max_workers` and `batch_timeout`
    async fn fetch_all(&self, pending: Vec<String>) -> Vec<(String, String)> {
        let batch_timeout = self.options.batch_timeout;
        let fetch_timeout = self.options.fetch_timeout;
        let semaphore = Arc::new(Semaphore::new(self.options.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        debug!(
            "Downloading {} torrent files with {} workers",
            pending.len(),
            self.options.max_workers
        );

        for url in pending {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (url, None);
                };
                match timeout(fetch_timeout, source.fetch_info_hash(&url)).await {
                    Ok(hash) => (url, hash),
                    Err(_) => {
                        debug!("Torrent download timed out after {:?}: {}", fetch_timeout, url);
                        (url, None)
                    }
                }
            });
        }

        let mut resolved = Vec::new();
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((url, Some(hash))) if is_valid_info_hash(&hash) => resolved.push((url, hash)),
                    Ok((url, Some(hash))) => warn!("Discarding malformed hash {:?} for {}", hash, url),
                    Ok((url, None)) => debug!("Could not resolve hash for {}", url),
                    Err(e) => warn!("Torrent download task failed: {}", e),
                }
            }
        };

        if timeout(batch_timeout, collect).await.is_err() {
            warn!(
                "Batch download timed out after {:?}, abandoning {} downloads",
                batch_timeout,
                tasks.len()
            );
            tasks.abort_all();
        }

        resolved
    }
}
