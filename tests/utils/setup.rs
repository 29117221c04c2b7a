use axum::Router;
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;

use bookshelf::{
    auth::{password::hash_password, repository::InMemoryTokenRepository},
    author::{models::AuthorModel, repository::InMemoryAuthorRepository},
    book::{cover::CoverStore, models::GenreModel, repository::InMemoryBookRepository},
    build_router,
    user::{
        models::UserModel,
        repository::{InMemoryUserRepository, UserRepository},
    },
    AppState,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub static_root: PathBuf,
}

pub struct TestSetupBuilder {
    users: Vec<(String, String, i32)>,
    token_ttl: Duration,
    name: String,
}

impl TestSetupBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            users: vec![],
            token_ttl: Duration::hours(24),
            name: name.to_string(),
        }
    }

    /// Adds a user that will be stored before the router is built
    pub fn with_user(mut self, email: &str, password: &str, active: bool) -> Self {
        self.users
            .push((email.to_string(), password.to_string(), i32::from(active)));
        self
    }

    pub fn with_admin(self) -> Self {
        self.with_user("admin@example.com", "secret", true)
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub async fn build(self) -> TestSetup {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let books = Arc::new(InMemoryBookRepository::with_catalog(
            vec![AuthorModel {
                id: 1,
                author_name: "Ursula K. Le Guin".to_string(),
            }],
            vec![
                GenreModel {
                    id: 1,
                    genre_name: "Fantasy".to_string(),
                },
                GenreModel {
                    id: 2,
                    genre_name: "Science Fiction".to_string(),
                },
            ],
        ));
        let authors = Arc::new(InMemoryAuthorRepository::with_authors(vec![AuthorModel {
            id: 1,
            author_name: "Ursula K. Le Guin".to_string(),
        }]));

        for (email, password, active) in &self.users {
            let user = UserModel::new(
                email.clone(),
                "Test".to_string(),
                "User".to_string(),
                hash_password(password).unwrap(),
                *active,
            );
            users.insert_user(&user).await.unwrap();
        }

        let static_root = std::env::temp_dir().join(format!(
            "bookshelf-it-{}-{}",
            self.name,
            std::process::id()
        ));

        let state = AppState::new(
            users.clone(),
            tokens.clone(),
            books,
            authors,
            CoverStore::new(static_root.clone()),
            self.token_ttl,
        );

        TestSetup {
            app: build_router(state.clone()),
            state,
            users,
            tokens,
            static_root,
        }
    }
}
