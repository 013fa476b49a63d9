//! SQLite storage backend implementation.

use crate::error::{Error, Result};
use crate::storage::traits::{CacheStore, SettingsStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-based storage implementation.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("connection mutex poisoned".to_string()))
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            -- Credential-namespaced cache entries
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key       TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Global settings, credential and base URL
            CREATE TABLE IF NOT EXISTS settings (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO cache_entries (cache_key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1", params![key])?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT cache_key FROM cache_entries ORDER BY cache_key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteStorage {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO settings (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_store() {
        let storage = SqliteStorage::in_memory().unwrap();

        storage.put("a::groups", "[1]").await.unwrap();
        assert_eq!(storage.get("a::groups").await.unwrap().as_deref(), Some("[1]"));

        // Whole-value replacement
        storage.put("a::groups", "[2]").await.unwrap();
        assert_eq!(storage.get("a::groups").await.unwrap().as_deref(), Some("[2]"));

        assert_eq!(storage.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_remove_clear() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.put("b::projects", "[]").await.unwrap();
        storage.put("a::groups", "[]").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["a::groups", "b::projects"]);

        storage.remove("a::groups").await.unwrap();
        storage.remove("a::groups").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["b::projects"]);

        storage.clear().await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_are_separate_from_cache() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.put_setting("base_url", "https://gitlab.example.com").await.unwrap();
        storage.clear().await.unwrap();

        assert_eq!(
            storage.get_setting("base_url").await.unwrap().as_deref(),
            Some("https://gitlab.example.com")
        );
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");

        {
            let storage = SqliteStorage::new(&db_path).unwrap();
            storage.put("a::groups", "[{\"id\":1}]").await.unwrap();
            storage.put_setting("credential", "glpat-x").await.unwrap();
        }

        // Reopen and verify
        {
            let storage = SqliteStorage::new(&db_path).unwrap();
            assert_eq!(
                storage.get("a::groups").await.unwrap().as_deref(),
                Some("[{\"id\":1}]")
            );
            assert_eq!(
                storage.get_setting("credential").await.unwrap().as_deref(),
                Some("glpat-x")
            );
        }
    }
}
