use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{repository::TokenRepository, service::AuthService};
use crate::author::repository::AuthorRepository;
use crate::book::{cover::CoverStore, repository::BookRepository, service::BookService};
use crate::user::{repository::UserRepository, service::UserService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub token_repository: Arc<dyn TokenRepository + Send + Sync>,
    pub book_repository: Arc<dyn BookRepository + Send + Sync>,
    pub author_repository: Arc<dyn AuthorRepository + Send + Sync>,
    pub cover_store: CoverStore,
    pub token_ttl: Duration,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        token_repository: Arc<dyn TokenRepository + Send + Sync>,
        book_repository: Arc<dyn BookRepository + Send + Sync>,
        author_repository: Arc<dyn AuthorRepository + Send + Sync>,
        cover_store: CoverStore,
        token_ttl: Duration,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            book_repository,
            author_repository,
            cover_store,
            token_ttl,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            Arc::clone(&self.token_repository),
            Arc::clone(&self.user_repository),
            self.token_ttl,
        )
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            Arc::clone(&self.user_repository),
            Arc::clone(&self.token_repository),
        )
    }

    pub fn book_service(&self) -> BookService {
        BookService::new(Arc::clone(&self.book_repository), self.cover_store.clone())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

const GENERIC_SERVER_ERROR: &str = "internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidToken(msg) | AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_SERVER_ERROR.to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_SERVER_ERROR.to_string(),
                )
            }
        };

        (status, Json(JsonResponse::failure(message))).into_response()
    }
}

/// Uniform response body: `{error, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful response carrying only data, with an empty message
    pub fn data(data: T) -> Self {
        Self::success(String::new(), data)
    }
}

impl JsonResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Return type shared by every JSON handler
pub type ApiResult<T> = Result<(StatusCode, Json<JsonResponse<T>>), AppError>;

/// JSON body extractor that answers malformed input with an error envelope
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(reason = %rejection.body_text(), "Rejected request body");
                Err(AppError::BadRequest(
                    "invalid json supplied, or json missing entirely".to_string(),
                ))
            }
        }
    }
}

/// Request payload carrying a single record identifier
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: i32,
}

/// Parses a numeric path segment, rejecting anything that is not a positive id
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("invalid id: {}", raw))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn render(error: AppError) -> (StatusCode, JsonResponse) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let (status, body) = render(AppError::BadRequest("title is required".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error);
        assert_eq!(body.message, "title is required");
        assert!(body.data.is_none());

        let (status, _) = render(AppError::InvalidToken("expired token".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = render(AppError::NotFound("book not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) =
            render(AppError::DatabaseError("connection refused".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, GENERIC_SERVER_ERROR);

        let (status, body) = render(AppError::Internal("disk full".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("disk"));
    }

    #[test]
    fn test_envelope_omits_missing_data() {
        let json = serde_json::to_value(JsonResponse::message("logged out")).unwrap();
        assert_eq!(json["error"], false);
        assert_eq!(json["message"], "logged out");
        assert!(json.get("data").is_none());

        let json = serde_json::to_value(JsonResponse::data(true)).unwrap();
        assert_eq!(json["message"], "");
        assert_eq!(json["data"], true);
    }

    #[rstest]
    #[case("7", Some(7))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("abc", None)]
    fn test_parse_id(#[case] raw: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_id(raw).ok(), expected);
    }
}
