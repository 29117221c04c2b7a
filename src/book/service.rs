use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{cover::CoverStore, models::BookModel, repository::BookRepository, types::SaveBookRequest};
use crate::shared::AppError;

/// Service for handling book catalogue business logic
pub struct BookService {
    books: Arc<dyn BookRepository + Send + Sync>,
    covers: CoverStore,
}

impl BookService {
    pub fn new(books: Arc<dyn BookRepository + Send + Sync>, covers: CoverStore) -> Self {
        Self { books, covers }
    }

    #[instrument(skip(self))]
    pub async fn list_books(&self) -> Result<Vec<BookModel>, AppError> {
        self.books.list_books().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<BookModel, AppError> {
        self.books
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i32) -> Result<BookModel, AppError> {
        self.books
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    /// Creates the book when `id` is 0, otherwise updates the existing one.
    ///
    /// A supplied cover is written before the database is touched, so an
    /// undecodable cover leaves the catalogue unchanged.
    #[instrument(skip(self, request), fields(id = request.id, title = %request.title))]
    pub async fn save_book(&self, request: SaveBookRequest) -> Result<BookModel, AppError> {
        if request.title.trim().is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }

        let mut genre_ids = request.genre_ids;
        genre_ids.sort_unstable();
        genre_ids.dedup();

        let mut book = if request.id == 0 {
            BookModel::new(
                request.title,
                request.author_id,
                request.publication_year,
                request.description,
                genre_ids,
            )
        } else {
            let mut existing = self.get_by_id(request.id).await?;
            existing.set_title(request.title);
            existing.author_id = request.author_id;
            existing.publication_year = request.publication_year;
            existing.description = request.description;
            existing.genre_ids = genre_ids;
            existing
        };

        if book.slug.is_empty() {
            return Err(AppError::BadRequest(
                "title must contain at least one letter or digit".to_string(),
            ));
        }

        if !request.cover.is_empty() {
            let path = self.covers.save_base64(&book.slug, &request.cover).await?;
            debug!(path = %path.display(), "Cover stored");
        }

        if book.id == 0 {
            book.id = self.books.insert_book(&book).await?;
            info!(book_id = book.id, slug = %book.slug, "Book created");
        } else {
            self.books.update_book(&book).await?;
            info!(book_id = book.id, slug = %book.slug, "Book updated");
        }

        Ok(book)
    }

    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: i32) -> Result<(), AppError> {
        self.books.delete_book(id).await?;

        info!(book_id = id, "Book deleted");
        Ok(())
    }
}
