use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::{
    models::BookModel,
    types::{SaveBookRequest, SavedBook},
};
use crate::shared::{parse_id, ApiResult, AppState, IdRequest, JsonBody, JsonResponse};

/// HTTP handler for listing the catalogue
///
/// GET /books
/// Returns `{books: [...]}`
#[instrument(name = "all_books", skip(state))]
pub async fn all_books(State(state): State<AppState>) -> ApiResult<Value> {
    let books = state.book_service().list_books().await?;

    info!(book_count = books.len(), "Books listed successfully");

    Ok((
        StatusCode::OK,
        Json(JsonResponse::success("success", json!({ "books": books }))),
    ))
}

/// HTTP handler for fetching a book by its slug
///
/// GET /books/:slug
#[instrument(name = "one_book", skip(state))]
pub async fn one_book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<BookModel> {
    let book = state.book_service().get_by_slug(&slug).await?;

    Ok((StatusCode::OK, Json(JsonResponse::data(book))))
}

/// HTTP handler for fetching a book by id
///
/// POST /admin/books/:id
#[instrument(name = "book_by_id", skip(state))]
pub async fn book_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BookModel> {
    let book = state.book_service().get_by_id(parse_id(&id)?).await?;

    Ok((StatusCode::OK, Json(JsonResponse::data(book))))
}

/// HTTP handler for creating or updating a book, optionally with a cover
///
/// POST /admin/books/save
#[instrument(name = "save_book", skip(state, request), fields(id = request.id))]
pub async fn save_book(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveBookRequest>,
) -> ApiResult<SavedBook> {
    let book = state.book_service().save_book(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JsonResponse::success(
            "Changes saved",
            SavedBook {
                id: book.id,
                slug: book.slug,
            },
        )),
    ))
}

/// HTTP handler for deleting a book
///
/// POST /admin/books/delete
#[instrument(name = "delete_book", skip(state, request), fields(id = request.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<IdRequest>,
) -> ApiResult<()> {
    state.book_service().delete_book(request.id).await?;

    Ok((StatusCode::OK, Json(JsonResponse::message("Book deleted"))))
}
