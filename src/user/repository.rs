use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    /// All users ordered by last name, then first name
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn get_by_id(&self, id: i32) -> Result<Option<UserModel>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    /// Stores a new user and returns its generated id
    async fn insert_user(&self, user: &UserModel) -> Result<i32, AppError>;
    /// Updates profile fields and the active flag; the password is left alone
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn reset_password(&self, id: i32, password_hash: &str) -> Result<(), AppError>;
    async fn delete_user(&self, id: i32) -> Result<(), AppError>;
}

fn email_taken() -> AppError {
    AppError::BadRequest("email address already in use".to_string())
}

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: HashMap<i32, UserModel>,
}

/// In-memory implementation of UserRepository for development and testing
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of stored users
    pub async fn user_count(&self) -> usize {
        self.table.read().await.rows.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let table = self.table.read().await;
        let mut users: Vec<UserModel> = table.rows.values().cloned().collect();
        users.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });

        debug!(user_count = users.len(), "Users listed from memory");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Option<UserModel>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: &UserModel) -> Result<i32, AppError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.email == user.email) {
            warn!("User email already exists in memory");
            return Err(email_taken());
        }

        table.next_id += 1;
        let id = table.next_id;
        let now = Utc::now();
        let mut stored = user.clone();
        stored.id = id;
        stored.created_at = now;
        stored.updated_at = now;
        table.rows.insert(id, stored);

        debug!(user_id = id, "User created in memory");
        Ok(id)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut table = self.table.write().await;
        if table
            .rows
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            warn!("User email already exists in memory");
            return Err(email_taken());
        }

        let stored = table
            .rows
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        stored.email = user.email.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.active = user.active;
        stored.updated_at = Utc::now();

        debug!("User updated in memory");
        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn reset_password(&self, id: i32, password_hash: &str) -> Result<(), AppError> {
        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        stored.password = password_hash.to_string();
        stored.updated_at = Utc::now();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        if self.table.write().await.rows.remove(&id).is_none() {
            debug!(user_id = id, "No user to delete in memory");
        }
        Ok(())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password, user_active, created_at, updated_at";

fn map_write_error(e: sqlx::Error) -> AppError {
    let unique_violation = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique_violation {
        return email_taken();
    }
    warn!(error = %e, "Failed to write user to database");
    AppError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let users = sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(user_count = users.len(), "Users listed from database");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to fetch user by id");
                AppError::DatabaseError(e.to_string())
            })
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: &UserModel) -> Result<i32, AppError> {
        let now = Utc::now();
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, first_name, last_name, password, user_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(user.active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(user_id = id, "User created in database");
        Ok(id)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, first_name = $3, last_name = $4, user_active = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            warn!("User not found for update");
            return Err(AppError::NotFound("user not found".to_string()));
        }

        debug!("User updated in database");
        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn reset_password(&self, id: i32, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to reset password");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to delete user");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!(rows_affected = result.rows_affected(), "User delete executed");
        Ok(())
    }
}
