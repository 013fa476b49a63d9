//! CodeScout HTTP API
//!
//! Exposes the search service to a browser front end. Searches run in the
//! background; the front end polls for progress and result pages.

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{router, start};
