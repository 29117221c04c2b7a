use axum::http::HeaderMap;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::TokenModel,
    password::password_matches,
    repository::TokenRepository,
    token::{bearer_token, generate, hash_token},
    types::LoginResponse,
};
use crate::shared::AppError;
use crate::user::{models::UserModel, repository::UserRepository};

const INVALID_CREDENTIALS: &str = "invalid username/password";

/// Service for issuing, validating and revoking bearer tokens
pub struct AuthService {
    tokens: Arc<dyn TokenRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(
        tokens: Arc<dyn TokenRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        ttl: Duration,
    ) -> Self {
        Self { tokens, users, ttl }
    }

    /// Checks credentials, then issues and stores a token for the user
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = match self.users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                info!("Login attempt for unknown email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !password_matches(password, &user.password)? {
            info!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active() {
            info!(user_id = user.id, "Login attempt for inactive user");
            return Err(AppError::Unauthorized("user is not active".to_string()));
        }

        let token = generate(user.id, self.ttl);
        let token = self.insert(token, &user).await?;

        info!(user_id = user.id, token_id = token.id, "User logged in");
        Ok(LoginResponse { token, user })
    }

    /// Persists a generated token on behalf of `user`
    #[instrument(skip(self, token, user), fields(user_id = user.id))]
    pub async fn insert(&self, mut token: TokenModel, user: &UserModel) -> Result<TokenModel, AppError> {
        token.user_id = user.id;
        token.email = user.email.clone();
        token.id = self.tokens.insert_token(&token).await?;

        debug!(token_id = token.id, "Token persisted");
        Ok(token)
    }

    /// Resolves a plaintext token to its stored record.
    ///
    /// Fails with `InvalidToken` when the token is unknown or expired, or when
    /// its owner no longer exists or is inactive.
    #[instrument(skip(self, plaintext))]
    pub async fn validate(&self, plaintext: &str) -> Result<TokenModel, AppError> {
        self.resolve(plaintext).await.map(|(token, _)| token)
    }

    /// Authenticates a request from its `Authorization` header and returns
    /// the owning user.
    #[instrument(skip(self, headers))]
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<UserModel, AppError> {
        let plaintext = bearer_token(headers)?;

        match self.resolve(plaintext).await {
            Ok((_, user)) => {
                debug!(user_id = user.id, "Request authenticated");
                Ok(user)
            }
            Err(AppError::InvalidToken(reason)) => Err(AppError::Unauthorized(reason)),
            Err(e) => Err(e),
        }
    }

    /// Revokes a single token; unknown tokens are ignored
    #[instrument(skip(self, plaintext))]
    pub async fn delete_by_token(&self, plaintext: &str) -> Result<(), AppError> {
        self.tokens.delete_by_hash(&hash_token(plaintext)).await
    }

    /// Revokes every session of a user
    #[instrument(skip(self))]
    pub async fn delete_all_for_user(&self, user_id: i32) -> Result<u64, AppError> {
        let removed = self.tokens.delete_for_user(user_id).await?;
        info!(user_id, removed, "Revoked all user tokens");
        Ok(removed)
    }

    async fn resolve(&self, plaintext: &str) -> Result<(TokenModel, UserModel), AppError> {
        let mut token = self
            .tokens
            .get_by_hash(&hash_token(plaintext))
            .await?
            .ok_or_else(|| {
                debug!("No matching token found");
                AppError::InvalidToken("no matching token found".to_string())
            })?;

        if token.is_expired() {
            warn!(token_id = token.id, "Token found but has expired");
            return Err(AppError::InvalidToken("expired token".to_string()));
        }

        let user = self
            .users
            .get_by_id(token.user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = token.user_id, "Token owner no longer exists");
                AppError::InvalidToken("no matching user found".to_string())
            })?;

        if !user.is_active() {
            warn!(user_id = user.id, "Token owner is not active");
            return Err(AppError::InvalidToken("user is not active".to_string()));
        }

        token.token = plaintext.to_string();
        Ok((token, user))
    }
}
