use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{models::UserModel, repository::UserRepository, types::SaveUserRequest};
use crate::auth::{password::hash_password, repository::TokenRepository};
use crate::shared::AppError;

/// Service for handling user management business logic
pub struct UserService {
    users: Arc<dyn UserRepository + Send + Sync>,
    tokens: Arc<dyn TokenRepository + Send + Sync>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        tokens: Arc<dyn TokenRepository + Send + Sync>,
    ) -> Self {
        Self { users, tokens }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        self.users.list_users().await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<UserModel, AppError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    /// Creates the user when `id` is 0, otherwise updates the existing one.
    /// Returns the id of the saved user.
    #[instrument(skip(self, request), fields(id = request.id, email = %request.email))]
    pub async fn save_user(&self, request: SaveUserRequest) -> Result<i32, AppError> {
        if request.email.trim().is_empty() {
            return Err(AppError::BadRequest("email is required".to_string()));
        }

        if request.id == 0 {
            self.create_user(request).await
        } else {
            self.update_user(request).await
        }
    }

    async fn create_user(&self, request: SaveUserRequest) -> Result<i32, AppError> {
        if request.password.is_empty() {
            return Err(AppError::BadRequest(
                "password is required for new users".to_string(),
            ));
        }

        let user = UserModel::new(
            request.email,
            request.first_name,
            request.last_name,
            hash_password(&request.password)?,
            request.active,
        );
        let id = self.users.insert_user(&user).await?;

        info!(user_id = id, "User created");
        Ok(id)
    }

    async fn update_user(&self, request: SaveUserRequest) -> Result<i32, AppError> {
        let mut user = self.get_user(request.id).await?;

        user.email = request.email;
        user.first_name = request.first_name;
        user.last_name = request.last_name;
        user.active = request.active;
        user.touch();
        self.users.update_user(&user).await?;

        if !request.password.is_empty() {
            let hash = hash_password(&request.password)?;
            self.users.reset_password(user.id, &hash).await?;
            debug!(user_id = user.id, "Password reset");
        }

        if !user.is_active() {
            let removed = self.tokens.delete_for_user(user.id).await?;
            debug!(user_id = user.id, removed, "Revoked tokens of deactivated user");
        }

        info!(user_id = user.id, "User updated");
        Ok(user.id)
    }

    /// Deletes a user together with every token it holds
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i32) -> Result<(), AppError> {
        self.tokens.delete_for_user(id).await?;
        self.users.delete_user(id).await?;

        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Marks the user inactive and revokes all of its sessions
    #[instrument(skip(self))]
    pub async fn log_out_and_deactivate(&self, id: i32) -> Result<(), AppError> {
        let mut user = self.get_user(id).await?;
        user.active = 0;
        user.touch();
        self.users.update_user(&user).await?;

        let removed = self.tokens.delete_for_user(id).await?;
        info!(user_id = id, removed, "User logged out and set to inactive");
        Ok(())
    }
}
