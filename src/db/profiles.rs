use std::collections::HashMap;

use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Readers list at most this many favorite authors
pub const MAX_FAVORITE_AUTHORS: usize = 5;

/// Source of each reader's favorite author names
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserProfileStore: Send + Sync {
    /// Favorite author names in profile order, at most [`MAX_FAVORITE_AUTHORS`]
    ///
    /// Fails with `NotFound` when the reader does not exist.
    async fn favorite_authors(&self, reader_id: i64) -> AppResult<Vec<String>>;
}

/// Splits a stored `;`-separated author list
pub fn parse_favorite_authors(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .take(MAX_FAVORITE_AUTHORS)
        .map(str::to_string)
        .collect()
}

fn reader_not_found(reader_id: i64) -> AppError {
    AppError::NotFound(format!("User ID {} not found", reader_id))
}

/// Reader profiles stored in PostgreSQL
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserProfileStore for PgProfileStore {
    async fn favorite_authors(&self, reader_id: i64) -> AppResult<Vec<String>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT favorite_authors FROM readers WHERE id = $1")
                .bind(reader_id)
                .fetch_optional(&self.pool)
                .await?;

        let raw = raw.ok_or_else(|| reader_not_found(reader_id))?;
        let authors = parse_favorite_authors(&raw);

        tracing::debug!(reader_id, authors = authors.len(), "Loaded favorite authors");

        Ok(authors)
    }
}

/// Reader profiles held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    readers: HashMap<i64, Vec<String>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three sample readers shipped with the service
    pub fn seeded() -> Self {
        Self::new()
            .with_reader(
                1,
                "Andy Weir; Brandon Sanderson; Arthur C. Clarke; Ursula K. Le Guin; H.G. Wells",
            )
            .with_reader(
                2,
                "George R. R. Martin; Robert Jordan; Neil Gaiman; Robin Hobb; Steven Erikson",
            )
            .with_reader(
                3,
                "Patrick Radden Keefe; Jon Krakauer; David Grann; Charles Montgomery; Jeff Speck",
            )
    }

    /// Adds a reader from a `;`-separated author list
    pub fn with_reader(mut self, reader_id: i64, favorite_authors: &str) -> Self {
        self.readers
            .insert(reader_id, parse_favorite_authors(favorite_authors));
        self
    }
}

#[async_trait::async_trait]
impl UserProfileStore for InMemoryProfileStore {
    async fn favorite_authors(&self, reader_id: i64) -> AppResult<Vec<String>> {
        self.readers
            .get(&reader_id)
            .cloned()
            .ok_or_else(|| reader_not_found(reader_id))
    }
}
