//! Credential-scoped cache.
//!
//! Values are stored as JSON under `<credential fingerprint>::<logical key>`.
//! Reads and writes with an empty credential are no-ops, so no entry is ever
//! stored without an owner.

use crate::credential::{Credential, CredentialId};
use crate::storage::CacheStore;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between the owner fingerprint and the logical key.
pub const KEY_SEPARATOR: &str = "::";

/// Logical key of the cached group inventory.
pub const GROUPS_KEY: &str = "groups";

/// Logical key of the cached project inventory.
pub const PROJECTS_KEY: &str = "projects";

/// Typed, credential-namespaced view over a [`CacheStore`].
pub struct CredentialCache<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CredentialCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CacheStore + ?Sized> CredentialCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn namespaced(key: &str, credential: &Credential) -> String {
        format!("{}{}{}", credential.id(), KEY_SEPARATOR, key)
    }

    /// Split a stored key into its owner and logical key.
    pub fn owner_of(stored_key: &str) -> Option<(CredentialId, &str)> {
        let (owner, key) = stored_key.split_once(KEY_SEPARATOR)?;
        Some((CredentialId::from_hex(owner)?, key))
    }

    /// Read a cached value for a credential.
    ///
    /// A value that no longer deserializes is treated as absent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        credential: &Credential,
    ) -> Result<Option<T>> {
        if credential.is_empty() {
            return Ok(None);
        }
        let Some(raw) = self.store.get(&Self::namespaced(key, credential)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding unreadable cache entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    /// Write a value for a credential, replacing any previous one.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        credential: &Credential,
        value: &T,
    ) -> Result<()> {
        if credential.is_empty() {
            debug!("Skipping cache write for '{}' without a credential", key);
            return Ok(());
        }
        let raw = serde_json::to_string(value)?;
        self.store.put(&Self::namespaced(key, credential), &raw).await
    }

    /// Remove every entry owned by a different credential.
    ///
    /// Keys that do not carry an owner are left alone. Returns the number of
    /// entries removed.
    pub async fn evict_foreign(&self, current: &Credential) -> Result<usize> {
        let current_id = current.id();
        let mut removed = 0;
        for key in self.store.keys().await? {
            let foreign = match Self::owner_of(&key) {
                Some((owner, _)) => owner != current_id,
                None => false,
            };
            if foreign {
                self.store.remove(&key).await?;
                removed += 1;
            }
        }
        info!("Cleared {} cache entries of other credentials", removed);
        Ok(removed)
    }

    /// Remove every cache entry, whoever owns it.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear().await?;
        info!("All caches cleared");
        Ok(())
    }
}
