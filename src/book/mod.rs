// Public API - what other modules can use
pub use handlers::{all_books, book_by_id, delete_book, one_book, save_book};

// Internal modules
pub mod cover;
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod slug;
pub mod types;
