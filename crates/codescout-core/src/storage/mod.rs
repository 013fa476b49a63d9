//! Storage abstraction layer.
//!
//! This module provides trait-based key/value storage that the credential
//! cache and settings persistence are built on, with a SQLite backend.

mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CacheStore, SettingsStore};
