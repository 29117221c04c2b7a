use serde::{Deserialize, Serialize};

/// Request payload for creating (id 0 or absent) or updating a book
#[derive(Debug, Clone, Deserialize)]
pub struct SaveBookRequest {
    #[serde(default)]
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub publication_year: i32,
    #[serde(default)]
    pub description: String,
    /// Base64 encoded JPEG; empty when the cover is left unchanged
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Data returned after a book has been saved
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedBook {
    pub id: i32,
    pub slug: String,
}
