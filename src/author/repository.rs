use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::AuthorModel;
use crate::shared::AppError;

/// Trait for author repository operations
#[async_trait]
pub trait AuthorRepository {
    /// All authors ordered by name
    async fn list_authors(&self) -> Result<Vec<AuthorModel>, AppError>;
}

/// In-memory implementation of AuthorRepository for development and testing
#[derive(Default)]
pub struct InMemoryAuthorRepository {
    authors: RwLock<Vec<AuthorModel>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory repository with pre-populated authors
    pub fn with_authors(authors: Vec<AuthorModel>) -> Self {
        Self {
            authors: RwLock::new(authors),
        }
    }
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    #[instrument(skip(self))]
    async fn list_authors(&self) -> Result<Vec<AuthorModel>, AppError> {
        let mut authors = self.authors.read().await.clone();
        authors.sort_by(|a, b| a.author_name.cmp(&b.author_name));

        debug!(author_count = authors.len(), "Authors listed from memory");
        Ok(authors)
    }
}

/// PostgreSQL implementation of author repository
pub struct PostgresAuthorRepository {
    pool: PgPool,
}

impl PostgresAuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    #[instrument(skip(self))]
    async fn list_authors(&self) -> Result<Vec<AuthorModel>, AppError> {
        let authors = sqlx::query_as::<_, AuthorModel>(
            "SELECT id, author_name FROM authors ORDER BY author_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list authors");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(author_count = authors.len(), "Authors listed from database");
        Ok(authors)
    }
}
