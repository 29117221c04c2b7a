use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

/// Status and parsed JSON envelope of one request
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestSetup {
    /// Send a request through the full router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        ApiResponse {
            status,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    /// POST a JSON body to an admin route with the given token
    pub async fn admin_post(&self, uri: &str, token: &str, body: Value) -> ApiResponse {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse {
        self.send(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Log in and return the issued plaintext token
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status, StatusCode::OK, "login should succeed");
        response.body["data"]["token"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn logout(&self, token: &str) -> ApiResponse {
        self.send("POST", "/users/logout", None, Some(json!({ "token": token })))
            .await
    }

    /// Returns the `data` flag of `/validate-token`
    pub async fn token_is_valid(&self, token: &str) -> bool {
        let response = self
            .send("POST", "/validate-token", None, Some(json!({ "token": token })))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["data"].as_bool().unwrap()
    }

    pub async fn list_users(&self, token: &str) -> ApiResponse {
        self.send("POST", "/admin/users", Some(token), None).await
    }

    pub async fn save_book(&self, token: &str, book: Value) -> ApiResponse {
        self.admin_post("/admin/books/save", token, book).await
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.static_root).await;
    }
}
