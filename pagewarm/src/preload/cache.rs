//! Shared page content cache.
//!
//! Preloading fills this cache so a later navigation to the same page can
//! skip the network round-trip. Backed by `moka::future::Cache`, which is
//! safe to use from many tasks without blocking the runtime, and which
//! coalesces concurrent loads of the same key into one fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;

use super::content::{ContentKey, ContentSource};
use super::error::FetchError;

/// Default maximum number of cached documents.
pub const DEFAULT_CONTENT_CACHE_CAPACITY: u64 = 256;

/// Default lifetime of a cached document in seconds.
pub const DEFAULT_CONTENT_CACHE_TTL_SECS: u64 = 300;

/// Hit/miss counters for the content cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Page content cache keyed by [`ContentKey`].
pub struct PageContentCache {
    cache: Cache<String, Arc<Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for PageContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContentCache")
            .field("entries", &self.cache.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for PageContentCache {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONTENT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_CONTENT_CACHE_TTL_SECS),
        )
    }
}

impl PageContentCache {
    /// Create a cache holding up to `capacity` documents for `ttl` each.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached document, if present and fresh.
    pub async fn get(&self, key: ContentKey) -> Option<Arc<Value>> {
        let found = self.cache.get(&key.cache_key()).await;
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a document.
    pub async fn insert(&self, key: ContentKey, document: Value) {
        self.cache.insert(key.cache_key(), Arc::new(document)).await;
    }

    /// Return the cached document or fetch it from `source`.
    ///
    /// Concurrent calls for the same key share a single fetch. Failed
    /// fetches are not cached.
    pub async fn get_or_fetch(
        &self,
        key: ContentKey,
        source: &dyn ContentSource,
    ) -> Result<Arc<Value>, Arc<FetchError>> {
        if let Some(document) = self.get(key).await {
            return Ok(document);
        }

        self.cache
            .try_get_with(key.cache_key(), async move {
                source.fetch(key).await.map(Arc::new)
            })
            .await
    }

    /// Whether a document is cached.
    pub fn contains(&self, key: ContentKey) -> bool {
        self.cache.contains_key(&key.cache_key())
    }

    /// Drop one document.
    pub async fn invalidate(&self, key: ContentKey) {
        self.cache.invalidate(&key.cache_key()).await;
    }

    /// Drop every document.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Current counters.
    pub fn stats(&self) -> ContentCacheStats {
        ContentCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }
}
