//! String key-value stores backing the event cache.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

/// Persistent string key-value storage.
///
/// Writes replace the previous value for the key; there is no merge.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed store that survives restarts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn CacheStore) {
        assert_eq!(store.get("lumaEvents").unwrap(), None);

        store.set("lumaEvents", "first").unwrap();
        assert_eq!(store.get("lumaEvents").unwrap().as_deref(), Some("first"));

        store.set("lumaEvents", "second").unwrap();
        assert_eq!(store.get("lumaEvents").unwrap().as_deref(), Some("second"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_sqlite_in_memory() {
        exercise(&SqliteStore::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events_cache.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.set("lumaEvents", "{\"timestamp\":1}").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(
            store.get("lumaEvents").unwrap().as_deref(),
            Some("{\"timestamp\":1}")
        );
    }
}
