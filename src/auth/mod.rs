// Public API - what other modules can use
pub use cleanup_task::{start_token_cleanup_task, TokenCleanupConfig};
pub use handlers::{login, logout, validate_token};
pub use middleware::{require_token, AuthenticatedUser};

// Internal modules
pub mod cleanup_task;
mod handlers;
mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
pub mod types;
