use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};

use super::types::{LoginRequest, LoginResponse, TokenRequest};
use crate::shared::{ApiResult, AppState, JsonBody, JsonResponse};

/// HTTP handler for logging in
///
/// POST /users/login
/// Returns the issued token together with the user
#[instrument(name = "login", skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = state
        .auth_service()
        .login(&request.email, &request.password)
        .await?;

    info!(user_id = response.user.id, "Login succeeded");

    Ok((
        StatusCode::OK,
        Json(JsonResponse::success("logged in", response)),
    ))
}

/// HTTP handler for revoking a token
///
/// POST /users/logout
#[instrument(name = "logout", skip(state, request))]
pub async fn logout(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> ApiResult<()> {
    state.auth_service().delete_by_token(&request.token).await?;

    info!("Token revoked");

    Ok((StatusCode::OK, Json(JsonResponse::message("logged out"))))
}

/// HTTP handler reporting whether a token is currently usable
///
/// POST /validate-token
/// Always answers 200 with `data: true|false`
#[instrument(name = "validate_token", skip(state, request))]
pub async fn validate_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> ApiResult<bool> {
    let valid = state.auth_service().validate(&request.token).await.is_ok();

    info!(valid, "Token validation requested");

    Ok((StatusCode::OK, Json(JsonResponse::data(valid))))
}
