//! Cache store trait and error types

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to a cache store
///
/// None of these abort a crawl: the [`Cache`](crate::cache::Cache) adapter
/// logs them and carries on as if the entry was missing.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cached value codec error: {0}")]
    Codec(String),

    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A key-value store with no expiry
///
/// Keys are short ASCII strings (hex digests); values are opaque bytes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for log messages
    fn name(&self) -> &'static str;

    /// Returns the stored value, or `None` on a miss
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Stores a value that never expires, replacing any previous one
    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;
}
