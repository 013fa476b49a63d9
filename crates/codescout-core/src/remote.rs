//! The remote directory seam.

use crate::credential::Credential;
use crate::model::{Group, Project, SearchHit};
use crate::Result;
use async_trait::async_trait;

/// Items per page requested from listing endpoints. A page shorter than this
/// is the last one.
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched by one paginated listing.
pub const MAX_PAGES: u32 = 500;

/// Typed access to the code-hosting service.
///
/// Implementations attach the credential to every call, report non-success
/// responses as [`Error::Remote`](crate::Error::Remote) and network failures
/// as [`Error::Transport`](crate::Error::Transport).
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch one page (1-based) of the groups visible to the credential.
    async fn list_groups(&self, credential: &Credential, page: u32) -> Result<Vec<Group>>;

    /// Fetch one page (1-based) of the projects in a group.
    async fn list_projects(
        &self,
        group_id: u64,
        credential: &Credential,
        page: u32,
    ) -> Result<Vec<Project>>;

    /// Search blobs of a project. `git_ref` of `None` searches the default branch.
    async fn search_code(
        &self,
        project_id: u64,
        keyword: &str,
        credential: &Credential,
        git_ref: Option<&str>,
    ) -> Result<Vec<SearchHit>>;
}
