// Library crate for the bookshelf API
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod author;
pub mod book;
pub mod config;
pub mod routes;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConfigError};
pub use routes::build_router;
pub use shared::{AppError, AppState, JsonResponse};
