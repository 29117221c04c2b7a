use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::slug::slugify;
use crate::author::models::AuthorModel;

/// Database model for the genres table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct GenreModel {
    pub id: i32,
    pub genre_name: String,
}

/// A book with its author and genres resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookModel {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub publication_year: i32,
    pub description: String,
    pub slug: String,
    pub author: Option<AuthorModel>,
    pub genres: Vec<GenreModel>,
    pub genre_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookModel {
    /// Creates an unsaved book; the slug is derived from the title
    pub fn new(
        title: String,
        author_id: i32,
        publication_year: i32,
        description: String,
        genre_ids: Vec<i32>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: 0,
            slug: slugify(&title),
            title,
            author_id,
            publication_year,
            description,
            author: None,
            genres: Vec::new(),
            genre_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Changes the title and re-derives the slug from it
    pub fn set_title(&mut self, title: String) {
        self.slug = slugify(&title);
        self.title = title;
    }
}
