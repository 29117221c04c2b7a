use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};
use crate::user::models::UserModel;

/// The user resolved from the bearer token, available to handlers behind
/// `require_token` as `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserModel);

/// Bearer token middleware - validates the Authorization header and adds the
/// owning user to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::require_token))
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match state.auth_service().authenticate(req.headers()).await {
        Ok(user) => user,
        Err(AppError::Unauthorized(reason)) => {
            warn!(reason = %reason, "Token authentication failed");
            return Err(AppError::Unauthorized(
                "invalid authentication credentials".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    info!(user_id = user.id, "Authentication successful, adding user to request");
    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}
