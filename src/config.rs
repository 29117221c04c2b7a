use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} not set")]
    Missing(&'static str),

    #[error("Environment variable {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration read once at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub token_ttl: chrono::Duration,
    pub token_cleanup_interval: Duration,
    pub static_dir: PathBuf,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; unset keys
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let token_ttl_hours: i64 = parse_or(&lookup, "TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        let cleanup_secs: u64 = parse_or(&lookup, "TOKEN_CLEANUP_INTERVAL_SECS", 3600)?;
        if cleanup_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_CLEANUP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8081".to_string()),
            token_ttl: chrono::Duration::hours(token_ttl_hours),
            token_cleanup_interval: Duration::from_secs(cleanup_secs),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./static")),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
