//! Persisted settings.
//!
//! Throttling settings live under the `global` settings key and apply to
//! every credential. The credential and base URL are plain settings entries
//! of their own.

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::storage::SettingsStore;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

const GLOBAL_KEY: &str = "global";
const CREDENTIAL_KEY: &str = "credential";
const BASE_URL_KEY: &str = "base_url";

/// Accepted concurrency caps.
pub const CONCURRENCY_RANGE: RangeInclusive<usize> = 1..=20;

/// Accepted inter-request delays, in milliseconds.
pub const DELAY_RANGE_MS: RangeInclusive<u64> = 0..=5000;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";

/// Concurrency cap and per-unit delay of a work pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    pub concurrency_limit: usize,
    pub request_delay_ms: u64,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            request_delay_ms: 500,
        }
    }
}

impl Throttle {
    /// Create a validated throttle.
    pub fn new(concurrency_limit: usize, request_delay_ms: u64) -> Result<Self> {
        let throttle = Self {
            concurrency_limit,
            request_delay_ms,
        };
        throttle.validate()?;
        Ok(throttle)
    }

    pub fn validate(&self) -> Result<()> {
        if !CONCURRENCY_RANGE.contains(&self.concurrency_limit) {
            return Err(Error::Config(format!(
                "concurrency limit must be between {} and {}, got {}",
                CONCURRENCY_RANGE.start(),
                CONCURRENCY_RANGE.end(),
                self.concurrency_limit
            )));
        }
        if !DELAY_RANGE_MS.contains(&self.request_delay_ms) {
            return Err(Error::Config(format!(
                "request delay must be between {} and {} ms, got {}",
                DELAY_RANGE_MS.start(),
                DELAY_RANGE_MS.end(),
                self.request_delay_ms
            )));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Global throttling settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Pool used by search runs
    #[serde(default)]
    pub search: Throttle,
    /// Pool used when fetching project inventories
    #[serde(default)]
    pub inventory: Throttle,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.inventory.validate()
    }

    /// Load settings, falling back to defaults when none were saved.
    pub async fn load<S: SettingsStore + ?Sized>(store: &S) -> Result<Self> {
        match store.get_setting(GLOBAL_KEY).await? {
            Some(raw) => {
                let settings: Settings = serde_json::from_str(&raw)?;
                settings.validate()?;
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    /// Validate and persist settings.
    pub async fn save<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<()> {
        self.validate()?;
        store
            .put_setting(GLOBAL_KEY, &serde_json::to_string(self)?)
            .await
    }
}

/// Load the saved credential, empty when none was saved.
pub async fn load_credential<S: SettingsStore + ?Sized>(store: &S) -> Result<Credential> {
    Ok(store
        .get_setting(CREDENTIAL_KEY)
        .await?
        .map(Credential::new)
        .unwrap_or_default())
}

pub async fn save_credential<S: SettingsStore + ?Sized>(
    store: &S,
    credential: &Credential,
) -> Result<()> {
    store.put_setting(CREDENTIAL_KEY, credential.expose()).await
}

/// Load the saved base URL, if any.
pub async fn load_base_url<S: SettingsStore + ?Sized>(store: &S) -> Result<Option<String>> {
    store.get_setting(BASE_URL_KEY).await
}

pub async fn save_base_url<S: SettingsStore + ?Sized>(store: &S, base_url: &str) -> Result<()> {
    let base_url = base_url.trim().trim_end_matches('/');
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "base URL must start with http:// or https://, got '{}'",
            base_url
        )));
    }
    store.put_setting(BASE_URL_KEY, base_url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_throttle_bounds() {
        assert!(Throttle::new(1, 0).is_ok());
        assert!(Throttle::new(20, 5000).is_ok());
        assert!(matches!(Throttle::new(0, 100), Err(Error::Config(_))));
        assert!(matches!(Throttle::new(21, 100), Err(Error::Config(_))));
        assert!(matches!(Throttle::new(5, 5001), Err(Error::Config(_))));
        assert_eq!(Throttle::default().request_delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(Settings::load(&storage).await.unwrap(), Settings::default());

        let settings = Settings {
            search: Throttle::new(8, 100).unwrap(),
            inventory: Throttle::new(2, 0).unwrap(),
        };
        settings.save(&storage).await.unwrap();
        assert_eq!(Settings::load(&storage).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_saved() {
        let storage = SqliteStorage::in_memory().unwrap();
        let settings = Settings {
            search: Throttle {
                concurrency_limit: 50,
                request_delay_ms: 0,
            },
            inventory: Throttle::default(),
        };
        assert!(settings.save(&storage).await.is_err());
        assert_eq!(Settings::load(&storage).await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_credential_and_base_url() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(load_credential(&storage).await.unwrap().is_empty());

        save_credential(&storage, &Credential::new("glpat-1")).await.unwrap();
        assert_eq!(load_credential(&storage).await.unwrap(), Credential::new("glpat-1"));

        assert!(save_base_url(&storage, "gitlab.example.com").await.is_err());
        save_base_url(&storage, "https://gitlab.example.com/").await.unwrap();
        assert_eq!(
            load_base_url(&storage).await.unwrap().as_deref(),
            Some("https://gitlab.example.com")
        );
    }
}
