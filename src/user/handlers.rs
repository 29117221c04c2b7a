use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{
    models::UserModel,
    types::{SaveUserRequest, SavedUser},
};
use crate::auth::AuthenticatedUser;
use crate::shared::{parse_id, ApiResult, AppError, AppState, IdRequest, JsonBody, JsonResponse};

/// Admins may not remove or lock out the account they are acting with
fn ensure_not_self(current: &UserModel, target_id: i32, action: &str) -> Result<(), AppError> {
    if current.id == target_id {
        warn!(user_id = current.id, action, "Refused action on own account");
        return Err(AppError::BadRequest(format!(
            "you cannot {} your own account",
            action
        )));
    }
    Ok(())
}

/// HTTP handler for listing all users
///
/// POST /admin/users
/// Returns `{users: [...]}`
#[instrument(name = "all_users", skip(state))]
pub async fn all_users(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.user_service().list_users().await?;

    info!(user_count = users.len(), "Users listed successfully");

    Ok((
        StatusCode::OK,
        Json(JsonResponse::success("success", json!({ "users": users }))),
    ))
}

/// HTTP handler for creating or updating a user
///
/// POST /admin/users/save
#[instrument(name = "save_user", skip(state, request), fields(id = request.id))]
pub async fn save_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveUserRequest>,
) -> ApiResult<SavedUser> {
    let id = state.user_service().save_user(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JsonResponse::success("Changes saved", SavedUser { id })),
    ))
}

/// HTTP handler for fetching one user
///
/// POST /admin/users/get/:id
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserModel> {
    let user = state.user_service().get_user(parse_id(&id)?).await?;

    Ok((StatusCode::OK, Json(JsonResponse::data(user))))
}

/// HTTP handler for deleting a user
///
/// POST /admin/users/delete
#[instrument(name = "delete_user", skip(state, current, request), fields(id = request.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<IdRequest>,
) -> ApiResult<()> {
    ensure_not_self(&current, request.id, "delete")?;
    state.user_service().delete_user(request.id).await?;

    Ok((StatusCode::OK, Json(JsonResponse::message("User deleted"))))
}

/// HTTP handler that revokes every session of a user and deactivates it
///
/// POST /admin/log-user-out/:id
#[instrument(name = "log_user_out_and_set_inactive", skip(state, current))]
pub async fn log_user_out_and_set_inactive(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(current)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    ensure_not_self(&current, id, "deactivate")?;
    state.user_service().log_out_and_deactivate(id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JsonResponse::message("user logged out and set to inactive")),
    ))
}
