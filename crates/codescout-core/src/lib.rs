//! CodeScout Core Library
//!
//! Core types, credential-scoped caching, inventory resolution and the
//! multi-project search orchestrator for the CodeScout code search front end.

pub mod cache;
pub mod credential;
pub mod error;
pub mod inventory;
pub mod model;
pub mod pool;
pub mod query;
pub mod remote;
pub mod results;
pub mod search;
pub mod service;
pub mod settings;
pub mod storage;

#[cfg(test)]
pub mod testutils;

pub use cache::CredentialCache;
pub use credential::{Credential, CredentialId};
pub use error::{Error, Result};
pub use inventory::InventoryBuilder;
pub use model::{CodeMatch, Group, Namespace, Project, SearchHit};
pub use pool::WorkPool;
pub use query::{GroupFilter, SearchParameters};
pub use remote::{DirectoryClient, PAGE_SIZE};
pub use search::{RunProgress, RunStatus, SearchOrchestrator, SearchRun};
pub use settings::{Settings, Throttle};
