use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the tokens table.
///
/// Only `token_hash` is persisted; `token` holds the plaintext bearer value
/// while it is in flight (issued at login, or supplied by a client).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TokenModel {
    pub id: i32,
    pub user_id: i32,
    pub email: String,
    #[sqlx(skip)]
    pub token: String,
    #[serde(skip)]
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl TokenModel {
    /// Creates an unsaved token for a user that expires `ttl` from now
    pub fn new(user_id: i32, token: String, token_hash: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            user_id,
            email: String::new(),
            token,
            token_hash,
            created_at: now,
            updated_at: now,
            expiry: now + ttl,
        }
    }

    /// A token is only usable while its expiry is strictly in the future
    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now()
    }
}
