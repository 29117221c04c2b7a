use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct UserModel {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing, default)]
    pub password: String, // Argon2 PHC string, never sent to clients
    #[serde(rename = "user_active")]
    #[sqlx(rename = "user_active")]
    pub active: i32, // 0 disables login and every session of the user
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates an unsaved user; the id is assigned by the repository on insert
    pub fn new(
        email: String,
        first_name: String,
        last_name: String,
        password_hash: String,
        active: i32,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            email,
            first_name,
            last_name,
            password: password_hash,
            active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(active: i32) -> UserModel {
        UserModel::new(
            "admin@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            "$argon2id$hash".to_string(),
            active,
        )
    }

    #[test]
    fn test_new_user_is_unsaved() {
        let user = sample_user(1);
        assert_eq!(user.id, 0);
        assert!(user.is_active());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_inactive_flag() {
        assert!(!sample_user(0).is_active());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let json = serde_json::to_value(sample_user(1)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["user_active"], 1);
        assert_eq!(json["email"], "admin@example.com");
    }
}
