use serde::{Deserialize, Serialize};

use super::models::TokenModel;
use crate::user::models::UserModel;

/// Request payload for the login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request payload carrying a plaintext bearer token (logout, validation)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Data returned by a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: TokenModel,
    pub user: UserModel,
}
