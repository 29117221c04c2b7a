use serde::{Deserialize, Serialize};

/// Request payload for creating (id 0 or absent) or updating a user
#[derive(Debug, Clone, Deserialize)]
pub struct SaveUserRequest {
    #[serde(default)]
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Required on create; on update an empty value keeps the current password
    #[serde(default)]
    pub password: String,
    /// Always required: a save overwrites the flag, and 0 revokes every
    /// session of the user
    #[serde(rename = "user_active")]
    pub active: i32,
}

/// Data returned after a user has been saved
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedUser {
    pub id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_id_means_create() {
        let request: SaveUserRequest = serde_json::from_str(
            r#"{"email": "a@example.com", "first_name": "A", "last_name": "B", "password": "pw", "user_active": 1}"#,
        )
        .unwrap();
        assert_eq!(request.id, 0);
        assert_eq!(request.active, 1);
    }

    #[test]
    fn test_password_defaults_to_empty() {
        let request: SaveUserRequest = serde_json::from_str(
            r#"{"id": 4, "email": "a@example.com", "first_name": "A", "last_name": "B", "user_active": 1}"#,
        )
        .unwrap();
        assert!(request.password.is_empty());
        assert_eq!(request.active, 1);
    }

    #[test]
    fn test_active_flag_is_required() {
        let result = serde_json::from_str::<SaveUserRequest>(
            r#"{"id": 4, "email": "a@example.com", "first_name": "A", "last_name": "B"}"#,
        );
        assert!(result.is_err());
    }
}
