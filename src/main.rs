use bookshelf::{
    auth::{repository::PostgresTokenRepository, start_token_cleanup_task, TokenCleanupConfig},
    author::repository::PostgresAuthorRepository,
    book::{cover::CoverStore, repository::PostgresBookRepository},
    build_router,
    user::repository::PostgresUserRepository,
    AppConfig, AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bookshelf API server");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    info!(
        max_connections = config.database_max_connections,
        "Connected to database"
    );

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let token_repository = Arc::new(PostgresTokenRepository::new(pool.clone()));
    let app_state = AppState::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        token_repository.clone(),
        Arc::new(PostgresBookRepository::new(pool.clone())),
        Arc::new(PostgresAuthorRepository::new(pool)),
        CoverStore::new(config.static_dir.clone()),
        config.token_ttl,
    );

    tokio::spawn(start_token_cleanup_task(
        token_repository,
        TokenCleanupConfig {
            cleanup_interval: config.token_cleanup_interval,
        },
    ));

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
