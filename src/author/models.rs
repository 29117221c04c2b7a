use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the authors table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AuthorModel {
    pub id: i32,
    pub author_name: String,
}
