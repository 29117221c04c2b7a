// Public API - what other modules can use
pub use handlers::{all_users, delete_user, get_user, log_user_out_and_set_inactive, save_user};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
