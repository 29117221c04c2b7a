use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::TokenModel;
use crate::shared::AppError;

/// Trait for token repository operations
#[async_trait]
pub trait TokenRepository {
    /// Persists a token and returns its generated id
    async fn insert_token(&self, token: &TokenModel) -> Result<i32, AppError>;
    async fn get_by_hash(&self, token_hash: &[u8]) -> Result<Option<TokenModel>, AppError>;
    /// Deleting an unknown token is not an error
    async fn delete_by_hash(&self, token_hash: &[u8]) -> Result<(), AppError>;
    /// Removes every token of a user, returning how many were removed
    async fn delete_for_user(&self, user_id: i32) -> Result<u64, AppError>;
    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError>;
}

#[derive(Default)]
struct TokenTable {
    next_id: i32,
    rows: HashMap<Vec<u8>, TokenModel>,
}

/// In-memory implementation of TokenRepository for development and testing
///
/// Data is stored in memory and will be lost when the application restarts.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    table: RwLock<TokenTable>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of stored tokens
    pub async fn token_count(&self) -> usize {
        self.table.read().await.rows.len()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    #[instrument(skip(self, token), fields(user_id = token.user_id))]
    async fn insert_token(&self, token: &TokenModel) -> Result<i32, AppError> {
        let mut table = self.table.write().await;
        if table.rows.contains_key(&token.token_hash) {
            warn!("Token already exists in memory");
            return Err(AppError::DatabaseError("Token already exists".to_string()));
        }

        table.next_id += 1;
        let id = table.next_id;
        let mut stored = token.clone();
        stored.id = id;
        stored.token = String::new();
        table.rows.insert(stored.token_hash.clone(), stored);

        debug!(token_id = id, "Token stored in memory");
        Ok(id)
    }

    #[instrument(skip(self, token_hash))]
    async fn get_by_hash(&self, token_hash: &[u8]) -> Result<Option<TokenModel>, AppError> {
        Ok(self.table.read().await.rows.get(token_hash).cloned())
    }

    #[instrument(skip(self, token_hash))]
    async fn delete_by_hash(&self, token_hash: &[u8]) -> Result<(), AppError> {
        if self.table.write().await.rows.remove(token_hash).is_none() {
            debug!("No token to delete in memory");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_for_user(&self, user_id: i32) -> Result<u64, AppError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, token| token.user_id != user_id);
        let removed = (before - table.rows.len()) as u64;

        debug!(removed, "Deleted user tokens from memory");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let before = table.rows.len();
        table.rows.retain(|_, token| token.expiry > now);
        let removed = (before - table.rows.len()) as u64;

        debug!(expired_tokens_removed = removed, "Expired tokens cleaned up from memory");
        Ok(removed)
    }
}

/// PostgreSQL implementation of token repository
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    #[instrument(skip(self, token), fields(user_id = token.user_id))]
    async fn insert_token(&self, token: &TokenModel) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO tokens (user_id, email, token_hash, expiry, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(token.user_id)
        .bind(&token.email)
        .bind(&token.token_hash)
        .bind(token.expiry)
        .bind(token.created_at)
        .bind(token.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to store token in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(token_id = id, "Token stored in database");
        Ok(id)
    }

    #[instrument(skip(self, token_hash))]
    async fn get_by_hash(&self, token_hash: &[u8]) -> Result<Option<TokenModel>, AppError> {
        sqlx::query_as::<_, TokenModel>(
            "SELECT id, user_id, email, token_hash, created_at, updated_at, expiry \
             FROM tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch token from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self, token_hash))]
    async fn delete_by_hash(&self, token_hash: &[u8]) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete token from database");
                AppError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_for_user(&self, user_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete user tokens from database");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!(removed = result.rows_affected(), "Deleted user tokens from database");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to cleanup expired tokens");
                AppError::DatabaseError(e.to_string())
            })?;

        let rows_affected = result.rows_affected();
        debug!(expired_tokens_removed = rows_affected, "Expired tokens cleaned up");
        Ok(rows_affected)
    }
}
