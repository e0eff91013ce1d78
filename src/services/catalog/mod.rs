//! Bibliographic catalog abstraction
//!
//! Every pipeline stage talks to the remote catalog through this trait, so the
//! stages can be exercised against mocks and the HTTP client is injected once
//! at startup rather than shared as a global.
use crate::{
    error::AppResult,
    models::{AuthorCandidate, AuthorWork, Edition, SubjectWork, WorkDetail},
};

pub mod open_library;

pub use open_library::{build_http_client, OpenLibraryCatalog};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Author search by free-text name, in the catalog's relevance order
    async fn search_authors(&self, name: &str) -> AppResult<Vec<AuthorCandidate>>;

    /// Up to `limit` of an author's most relevant works
    async fn author_works(&self, author_key: &str, limit: usize) -> AppResult<Vec<AuthorWork>>;

    /// Up to `limit` works tagged with a subject, newest first
    async fn subject_works(&self, subject: &str, limit: usize) -> AppResult<Vec<SubjectWork>>;

    /// Up to `limit` editions of a work
    async fn work_editions(&self, work_key: &str, limit: usize) -> AppResult<Vec<Edition>>;

    /// Work detail, used for the long-form description
    async fn work_detail(&self, work_key: &str) -> AppResult<WorkDetail>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}

/// Strips the `/authors/` or `/works/` prefix some responses put on keys
pub fn bare_key(key: &str) -> &str {
    let key = key.trim();
    key.strip_prefix("/authors/")
        .or_else(|| key.strip_prefix("/works/"))
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_key() {
        assert_eq!(bare_key("/authors/OL23919A"), "OL23919A");
        assert_eq!(bare_key("/works/OL45804W"), "OL45804W");
        assert_eq!(bare_key("OL45804W"), "OL45804W");
        assert_eq!(bare_key(" /works/OL1W "), "OL1W");
    }
}
