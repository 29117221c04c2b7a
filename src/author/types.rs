use serde::{Deserialize, Serialize};

use super::models::AuthorModel;

/// `{value, text}` pair consumed by form select inputs
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: i32,
    pub text: String,
}

impl From<AuthorModel> for SelectOption {
    fn from(author: AuthorModel) -> Self {
        Self {
            value: author.id,
            text: author.author_name,
        }
    }
}
