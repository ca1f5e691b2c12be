//! Response cache
//!
//! This module holds everything between the crawler and its key-value store:
//! - Cache keys (MD5 hex digest of the request URL)
//! - The [`CacheStore`] trait and its memcached, SQLite and in-memory backends
//! - The [`Cache`] adapter, which turns a missing or failing store into
//!   cache misses instead of crawl failures
//! - [`CacheValue`], the encoding of raw documents and parsed values

mod memcached;
mod memory;
mod sqlite;
mod traits;
mod value;

pub use memcached::{MemcachedStore, DEFAULT_MEMCACHED_ADDR};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheError, CacheResult, CacheStore};
pub use value::CacheValue;

use md5::{Digest, Md5};
use std::path::PathBuf;
use std::sync::Arc;

/// Computes the cache key of a URL: lowercase hex MD5 of its UTF-8 bytes
///
/// # Example
///
/// ```
/// use racecrawl::cache::cache_key;
///
/// assert_eq!(cache_key(""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
pub fn cache_key(url: &str) -> String {
    hex::encode(Md5::digest(url.as_bytes()))
}

/// Which store to put behind the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// A memcached daemon at `host:port`
    Memcached { addr: String },
    /// A local SQLite file
    Sqlite { path: PathBuf },
    /// No caching at all
    Disabled,
}

/// Optional key-value store shared by every fetch of a crawl
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone, Default)]
pub struct Cache {
    store: Option<Arc<dyn CacheStore>>,
}

impl Cache {
    /// A cache that misses on every lookup
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Opens the configured backend
    ///
    /// A backend that cannot be reached is not an error: the crawl proceeds
    /// without a cache and every page is fetched.
    pub async fn open(backend: &CacheBackend) -> Self {
        let store: CacheResult<Arc<dyn CacheStore>> = match backend {
            CacheBackend::Disabled => {
                tracing::info!("Cache disabled");
                return Self::disabled();
            }
            CacheBackend::Memcached { addr } => MemcachedStore::connect(addr)
                .await
                .map(|s| Arc::new(s) as Arc<dyn CacheStore>),
            CacheBackend::Sqlite { path } => {
                SqliteStore::open(path).map(|s| Arc::new(s) as Arc<dyn CacheStore>)
            }
        };

        match store {
            Ok(store) => {
                tracing::info!("Using {} cache", store.name());
                Self::with_store(store)
            }
            Err(e) => {
                tracing::info!("No cache available ({}), fetching everything", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up a key; store failures are logged and reported as a miss
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("{} cache get {} failed: {}", store.name(), key, e);
                None
            }
        }
    }

    /// Stores a value with no expiry; store failures are logged and ignored
    pub async fn set(&self, key: &str, value: &[u8]) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.set(key, value).await {
            tracing::warn!("{} cache set {} failed: {}", store.name(), key, e);
        }
    }
}
