//! CodeScout GitLab client
//!
//! [`GitlabClient`] talks to the GitLab v4 REST API and implements the
//! [`DirectoryClient`](codescout_core::DirectoryClient) seam used by the
//! inventory builder and the search orchestrator.

pub mod client;
pub mod payload;

pub use client::{GitlabClient, DEFAULT_TIMEOUT, TOKEN_HEADER};
