//! SQLite key-value store
//!
//! A single table keyed by cache key. `stored_at` is informational only:
//! entries never expire, but the timestamp lets an operator find and purge
//! results that may have been corrected since they were cached.

use crate::cache::traits::{CacheResult, CacheStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQL schema for the cache database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

/// SQLite-backed cache store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a cache database file
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory cache database
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of cached entries
    pub fn count(&self) -> CacheResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // statements are atomic, so a poisoned connection is still consistent
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let conn = self.lock();
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, stored_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
