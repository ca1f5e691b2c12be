//! Cache-or-fetch

use crate::cache::{cache_key, Cache, CacheValue};
use crate::crawler::fetcher::fetch_url;
use crate::CrawlError;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fetches URLs through the cache
///
/// The caller decides what gets cached through the `transform` passed to
/// [`cached_fetch`](Self::cached_fetch): the identity caches raw documents,
/// a parsing transform caches the parsed value.
pub struct CachedFetcher {
    client: Client,
    cache: Cache,
    hits: AtomicU64,
    fetches: AtomicU64,
}

impl CachedFetcher {
    pub fn new(client: Client, cache: Cache) -> Self {
        Self {
            client,
            cache,
            hits: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `url`, or fetches, transforms and caches it
    ///
    /// On a hit `transform` is not run. On a miss the transformed value is
    /// stored under the URL's key with no expiry. A cached entry that cannot
    /// be decoded is treated as a miss and overwritten.
    pub async fn cached_fetch<T, F>(&self, url: &str, transform: F) -> Result<T, CrawlError>
    where
        T: CacheValue,
        F: FnOnce(&str) -> Result<T, CrawlError>,
    {
        let key = cache_key(url);

        if let Some(bytes) = self.cache.get(&key).await {
            match T::decode(&bytes) {
                Ok(value) => {
                    tracing::info!("Retrieved {} from cache", url);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(e) => tracing::warn!("Ignoring cached entry for {}: {}", url, e),
            }
        }

        tracing::info!("Querying {}", url);
        let body = fetch_url(&self.client, url).await?;
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let value = transform(&body)?;

        if self.cache.is_enabled() {
            self.cache.set(&key, &value.encode()?).await;
        }

        Ok(value)
    }

    /// Lookups answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Requests that went to the network
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}
