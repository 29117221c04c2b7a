use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{BookModel, GenreModel};
use crate::author::models::AuthorModel;
use crate::shared::AppError;

/// Trait for book repository operations.
///
/// Returned books carry their resolved author and genres.
#[async_trait]
pub trait BookRepository {
    /// All books ordered by title
    async fn list_books(&self) -> Result<Vec<BookModel>, AppError>;
    async fn get_by_id(&self, id: i32) -> Result<Option<BookModel>, AppError>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BookModel>, AppError>;
    /// Stores a new book with its genres and returns its generated id
    async fn insert_book(&self, book: &BookModel) -> Result<i32, AppError>;
    /// Updates a book and replaces its genres
    async fn update_book(&self, book: &BookModel) -> Result<(), AppError>;
    async fn delete_book(&self, id: i32) -> Result<(), AppError>;
}

fn unknown_reference() -> AppError {
    AppError::BadRequest("unknown author or genre".to_string())
}

/// Constraint violations are caused by the request (dangling author or genre
/// ids, repeated genres); everything else is a server failure.
fn map_write_error(e: sqlx::Error, action: &str) -> AppError {
    let client_error = e
        .as_database_error()
        .map(|db| db.is_foreign_key_violation() || db.is_unique_violation())
        .unwrap_or(false);
    if client_error {
        warn!(error = %e, "Book {} rejected by database constraint", action);
        return unknown_reference();
    }
    warn!(error = %e, "Failed to {} book in database", action);
    AppError::DatabaseError(e.to_string())
}

#[derive(Default)]
struct BookTable {
    next_id: i32,
    rows: HashMap<i32, BookModel>,
}

/// In-memory implementation of BookRepository for development and testing.
///
/// Authors and genres are fixed reference data used to resolve stored books.
pub struct InMemoryBookRepository {
    table: RwLock<BookTable>,
    authors: HashMap<i32, AuthorModel>,
    genres: HashMap<i32, GenreModel>,
}

impl InMemoryBookRepository {
    /// Creates an in-memory repository that resolves the given authors and genres
    pub fn with_catalog(authors: Vec<AuthorModel>, genres: Vec<GenreModel>) -> Self {
        Self {
            table: RwLock::default(),
            authors: authors.into_iter().map(|a| (a.id, a)).collect(),
            genres: genres.into_iter().map(|g| (g.id, g)).collect(),
        }
    }

    /// Rejects references the relational schema would refuse
    fn check_references(&self, book: &BookModel) -> Result<(), AppError> {
        if !self.authors.contains_key(&book.author_id) {
            warn!(author_id = book.author_id, "Unknown author referenced in memory");
            return Err(unknown_reference());
        }
        if let Some(genre_id) = book.genre_ids.iter().find(|id| !self.genres.contains_key(*id)) {
            warn!(genre_id, "Unknown genre referenced in memory");
            return Err(unknown_reference());
        }
        Ok(())
    }

    fn resolve(&self, book: &BookModel) -> BookModel {
        let mut resolved = book.clone();
        resolved.author = self.authors.get(&book.author_id).cloned();
        resolved.genres = book
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect();
        resolved.genres.sort_by(|a, b| a.genre_name.cmp(&b.genre_name));
        resolved
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    #[instrument(skip(self))]
    async fn list_books(&self) -> Result<Vec<BookModel>, AppError> {
        let table = self.table.read().await;
        let mut books: Vec<BookModel> = table.rows.values().map(|b| self.resolve(b)).collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));

        debug!(book_count = books.len(), "Books listed from memory");
        Ok(books)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Option<BookModel>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|b| self.resolve(b)))
    }

    #[instrument(skip(self))]
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BookModel>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|b| b.slug == slug)
            .min_by_key(|b| b.id)
            .map(|b| self.resolve(b)))
    }

    #[instrument(skip(self, book), fields(slug = %book.slug))]
    async fn insert_book(&self, book: &BookModel) -> Result<i32, AppError> {
        self.check_references(book)?;
        let mut table = self.table.write().await;
        table.next_id += 1;
        let id = table.next_id;

        let now = Utc::now();
        let mut stored = book.clone();
        stored.id = id;
        stored.created_at = now;
        stored.updated_at = now;
        table.rows.insert(id, stored);

        debug!(book_id = id, "Book created in memory");
        Ok(id)
    }

    #[instrument(skip(self, book), fields(book_id = book.id))]
    async fn update_book(&self, book: &BookModel) -> Result<(), AppError> {
        let mut table = self.table.write().await;
        let stored = table.rows.get_mut(&book.id).ok_or_else(|| {
            warn!("Book not found for update in memory");
            AppError::NotFound("book not found".to_string())
        })?;
        self.check_references(book)?;

        let created_at = stored.created_at;
        *stored = book.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();

        debug!("Book updated in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_book(&self, id: i32) -> Result<(), AppError> {
        if self.table.write().await.rows.remove(&id).is_none() {
            debug!(book_id = id, "No book to delete in memory");
        }
        Ok(())
    }
}

/// PostgreSQL implementation of book repository
pub struct PostgresBookRepository {
    pool: PgPool,
}

impl PostgresBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_books(&self, filter: BookFilter<'_>) -> Result<Vec<BookModel>, AppError> {
        let base = "SELECT b.id, b.title, b.author_id, b.publication_year, b.description, b.slug, \
                    b.created_at, b.updated_at, a.author_name \
                    FROM books b LEFT JOIN authors a ON a.id = b.author_id";

        let sql = match filter {
            BookFilter::All => format!("{base} ORDER BY b.title"),
            BookFilter::Id(_) => format!("{base} WHERE b.id = $1"),
            BookFilter::Slug(_) => format!("{base} WHERE b.slug = $1 ORDER BY b.id LIMIT 1"),
        };

        let query = sqlx::query_as::<_, BookRow>(&sql);
        let query = match filter {
            BookFilter::All => query,
            BookFilter::Id(id) => query.bind(id),
            BookFilter::Slug(slug) => query.bind(slug),
        };

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            warn!(error = %e, "Failed to fetch books from database");
            AppError::DatabaseError(e.to_string())
        })?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut genres = self.fetch_genres(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let book_genres = genres.remove(&row.id).unwrap_or_default();
                row.into_model(book_genres)
            })
            .collect())
    }

    async fn fetch_genres(&self, book_ids: &[i32]) -> Result<HashMap<i32, Vec<GenreModel>>, AppError> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, BookGenreRow>(
            "SELECT bg.book_id, g.id, g.genre_name FROM books_genres bg \
             JOIN genres g ON g.id = bg.genre_id \
             WHERE bg.book_id = ANY($1) ORDER BY g.genre_name",
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch book genres from database");
            AppError::DatabaseError(e.to_string())
        })?;

        let mut by_book: HashMap<i32, Vec<GenreModel>> = HashMap::new();
        for row in rows {
            by_book.entry(row.book_id).or_default().push(GenreModel {
                id: row.id,
                genre_name: row.genre_name,
            });
        }
        Ok(by_book)
    }

    async fn insert_in_tx(&self, book: &BookModel) -> Result<i32, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO books (title, author_id, publication_year, description, slug, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.publication_year)
        .bind(&book.description)
        .bind(&book.slug)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        replace_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Returns the number of updated rows; genres are only touched when the book exists
    async fn update_in_tx(&self, book: &BookModel) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE books SET title = $2, author_id = $3, publication_year = $4, description = $5, \
             slug = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.publication_year)
        .bind(&book.description)
        .bind(&book.slug)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated > 0 {
            replace_genres(&mut tx, book.id, &book.genre_ids).await?;
            tx.commit().await?;
        }
        Ok(updated)
    }
}

#[derive(Clone, Copy)]
enum BookFilter<'a> {
    All,
    Id(i32),
    Slug(&'a str),
}

#[derive(FromRow)]
struct BookRow {
    id: i32,
    title: String,
    author_id: i32,
    publication_year: i32,
    description: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: Option<String>,
}

impl BookRow {
    fn into_model(self, genres: Vec<GenreModel>) -> BookModel {
        BookModel {
            id: self.id,
            author: self.author_name.map(|author_name| AuthorModel {
                id: self.author_id,
                author_name,
            }),
            title: self.title,
            author_id: self.author_id,
            publication_year: self.publication_year,
            description: self.description,
            slug: self.slug,
            genre_ids: genres.iter().map(|g| g.id).collect(),
            genres,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct BookGenreRow {
    book_id: i32,
    id: i32,
    genre_name: String,
}

async fn replace_genres(
    tx: &mut Transaction<'static, Postgres>,
    book_id: i32,
    genre_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM books_genres WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

    let now = Utc::now();
    for genre_id in genre_ids {
        sqlx::query(
            "INSERT INTO books_genres (book_id, genre_id, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(book_id)
        .bind(genre_id)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl BookRepository for PostgresBookRepository {
    #[instrument(skip(self))]
    async fn list_books(&self) -> Result<Vec<BookModel>, AppError> {
        let books = self.fetch_books(BookFilter::All).await?;
        debug!(book_count = books.len(), "Books listed from database");
        Ok(books)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Option<BookModel>, AppError> {
        Ok(self.fetch_books(BookFilter::Id(id)).await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BookModel>, AppError> {
        Ok(self
            .fetch_books(BookFilter::Slug(slug))
            .await?
            .into_iter()
            .next())
    }

    #[instrument(skip(self, book), fields(slug = %book.slug))]
    async fn insert_book(&self, book: &BookModel) -> Result<i32, AppError> {
        let id = self
            .insert_in_tx(book)
            .await
            .map_err(|e| map_write_error(e, "create"))?;

        debug!(book_id = id, "Book created in database");
        Ok(id)
    }

    #[instrument(skip(self, book), fields(book_id = book.id))]
    async fn update_book(&self, book: &BookModel) -> Result<(), AppError> {
        let updated = self
            .update_in_tx(book)
            .await
            .map_err(|e| map_write_error(e, "update"))?;

        if updated == 0 {
            warn!("Book not found for update");
            return Err(AppError::NotFound("book not found".to_string()));
        }

        debug!("Book updated in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_book(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, book_id = id, "Failed to delete book");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!(rows_affected = result.rows_affected(), "Book delete executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_repository() -> InMemoryBookRepository {
        InMemoryBookRepository::with_catalog(
            vec![AuthorModel {
                id: 1,
                author_name: "Frank Herbert".to_string(),
            }],
            vec![
                GenreModel {
                    id: 1,
                    genre_name: "Science Fiction".to_string(),
                },
                GenreModel {
                    id: 2,
                    genre_name: "Adventure".to_string(),
                },
            ],
        )
    }

    fn create_test_book(title: &str, genre_ids: Vec<i32>) -> BookModel {
        BookModel::new(title.to_string(), 1, 1965, "Desert planet".to_string(), genre_ids)
    }

    #[tokio::test]
    async fn test_insert_resolves_author_and_genres() {
        let repo = catalog_repository();
        let id = repo.insert_book(&create_test_book("Dune", vec![1, 2])).await.unwrap();

        let book = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.author.unwrap().author_name, "Frank Herbert");
        let genre_names: Vec<String> = book.genres.into_iter().map(|g| g.genre_name).collect();
        assert_eq!(genre_names, vec!["Adventure", "Science Fiction"]);
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let repo = catalog_repository();
        let id = repo
            .insert_book(&create_test_book("Children of Dune", vec![]))
            .await
            .unwrap();

        let book = repo.get_by_slug("children-of-dune").await.unwrap().unwrap();
        assert_eq!(book.id, id);
        assert!(repo.get_by_slug("dune-messiah").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_books_sorted_by_title() {
        let repo = catalog_repository();
        repo.insert_book(&create_test_book("Dune Messiah", vec![])).await.unwrap();
        repo.insert_book(&create_test_book("Children of Dune", vec![])).await.unwrap();
        repo.insert_book(&create_test_book("Dune", vec![])).await.unwrap();

        let titles: Vec<String> = repo
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Children of Dune", "Dune", "Dune Messiah"]);
    }

    #[tokio::test]
    async fn test_update_replaces_genres() {
        let repo = catalog_repository();
        let id = repo.insert_book(&create_test_book("Dune", vec![1, 2])).await.unwrap();

        let mut book = repo.get_by_id(id).await.unwrap().unwrap();
        book.genre_ids = vec![2];
        book.set_title("Dune (Revised)".to_string());
        repo.update_book(&book).await.unwrap();

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.slug, "dune-revised");
        assert_eq!(stored.genres.len(), 1);
        assert_eq!(stored.genres[0].id, 2);
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let repo = catalog_repository();
        let mut book = create_test_book("Ghost", vec![]);
        book.id = 77;

        let result = repo.update_book(&book).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_author_rejected() {
        let repo = catalog_repository();
        let mut book = create_test_book("Dune", vec![1]);
        book.author_id = 5;

        let result = repo.insert_book(&book).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(repo.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_genre_rejected_on_update() {
        let repo = catalog_repository();
        let id = repo.insert_book(&create_test_book("Dune", vec![1])).await.unwrap();

        let mut book = repo.get_by_id(id).await.unwrap().unwrap();
        book.genre_ids = vec![1, 9];
        let result = repo.update_book(&book).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().genre_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_delete_book() {
        let repo = catalog_repository();
        let id = repo.insert_book(&create_test_book("Dune", vec![])).await.unwrap();

        repo.delete_book(id).await.unwrap();
        repo.delete_book(id).await.unwrap();
        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }
}
