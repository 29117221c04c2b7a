use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::shared::AppState;
use crate::{auth, author, book, user};

/// Cover images arrive base64 encoded inside the JSON body
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the full application router: public routes, the token protected
/// `/admin` group and the static file service.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let static_files = ServeDir::new(app_state.cover_store.static_root());

    Router::new()
        .route("/users/login", post(auth::login))
        .route("/users/logout", post(auth::logout))
        .route("/validate-token", post(auth::validate_token))
        .route("/books", get(book::all_books))
        .route("/books/:slug", get(book::one_book))
        .nest("/admin", admin_routes(app_state.clone()))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn admin_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", post(user::all_users))
        .route("/users/save", post(user::save_user))
        .route("/users/get/:id", post(user::get_user))
        .route("/users/delete", post(user::delete_user))
        .route("/log-user-out/:id", post(user::log_user_out_and_set_inactive))
        .route("/authors/all", post(author::authors_all))
        .route("/books/save", post(book::save_book))
        .route("/books/delete", post(book::delete_book))
        .route("/books/:id", post(book::book_by_id))
        .route_layer(middleware::from_fn_with_state(app_state, auth::require_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{seed_user, AppStateBuilder};
    use crate::shared::JsonResponse;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `oneshot`

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let app = build_router(AppStateBuilder::new().build());

        let request = Request::builder()
            .method("POST")
            .uri("/admin/users")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let envelope: JsonResponse = serde_json::from_slice(&body).unwrap();
        assert!(envelope.error);
        assert_eq!(envelope.message, "invalid authentication credentials");
    }

    #[tokio::test]
    async fn test_admin_routes_accept_bearer_token() {
        let state = AppStateBuilder::new().build();
        seed_user(&state.user_repository, "admin@example.com", "secret", 1).await;
        let issued = state
            .auth_service()
            .login("admin@example.com", "secret")
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/admin/users")
            .header("authorization", format!("Bearer {}", issued.token.token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(build_router(state), request).await;

        assert_eq!(status, StatusCode::OK);
        let envelope: JsonResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.data.unwrap()["users"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_book_routes_need_no_token() {
        let app = build_router(AppStateBuilder::new().build());

        let request = Request::builder().uri("/books").body(Body::empty()).unwrap();
        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let root = std::env::temp_dir().join(format!("bookshelf-routes-{}", std::process::id()));
        tokio::fs::create_dir_all(root.join("covers")).await.unwrap();
        tokio::fs::write(root.join("covers").join("dune.jpg"), b"jpeg")
            .await
            .unwrap();
        let app = build_router(AppStateBuilder::new().with_static_root(root.clone()).build());

        let request = Request::builder()
            .uri("/static/covers/dune.jpg")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"jpeg");
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
