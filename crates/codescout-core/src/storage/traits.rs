//! Storage trait definitions.

use crate::Result;
use async_trait::async_trait;

/// Whole-value key/value storage for cached inventories.
///
/// Keys arrive already namespaced; the store itself knows nothing about
/// credentials.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Retrieve the raw value stored under a key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;
}

/// Plain, non-namespaced settings storage.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Retrieve a setting.
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Store a setting, replacing any previous value.
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}
