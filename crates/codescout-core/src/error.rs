//! Error types for CodeScout.

use thiserror::Error;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// CodeScout error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing credential or keyword, rejected before any network activity
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-success response from the remote service
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Network failure talking to the remote service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote response that could not be interpreted
    #[error("Malformed payload: {0}")]
    Payload(String),

    /// Malformed client-side glob filter
    #[error("Filter error: {0}")]
    Filter(String),

    /// Pagination did not terminate within the page cap
    #[error("Pagination limit exceeded for {operation} after {pages} pages")]
    PaginationLimit { operation: String, pages: u32 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error is confined to a single remote unit of work.
    ///
    /// Isolated errors are logged and counted, never escalated to fail a
    /// whole inventory refresh or search run.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. } | Error::Transport(_) | Error::Payload(_)
        )
    }
}
