use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::repository::TokenRepository;

/// Configuration for the expired token sweeper
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to purge expired tokens
    pub cleanup_interval: Duration,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

/// Starts the background task that periodically removes expired tokens.
/// Runs until the runtime shuts down.
#[instrument(skip(token_repository))]
pub async fn start_token_cleanup_task(
    token_repository: Arc<dyn TokenRepository + Send + Sync>,
    config: TokenCleanupConfig,
) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        "Starting token cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;
        run_token_cleanup(&token_repository).await;
    }
}

/// Runs one sweep, returning how many tokens were removed
pub async fn run_token_cleanup(token_repository: &Arc<dyn TokenRepository + Send + Sync>) -> u64 {
    match token_repository.cleanup_expired_tokens().await {
        Ok(removed) => {
            info!(removed, "Token cleanup completed");
            removed
        }
        Err(e) => {
            error!(error = %e, "Token cleanup task failed");
            0
        }
    }
}
