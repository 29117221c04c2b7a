// Public API - what other modules can use
pub use handlers::authors_all;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod types;
