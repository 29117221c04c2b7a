use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use super::models::TokenModel;
use crate::shared::AppError;

/// Random bytes behind every bearer token
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded bearer token (URL-safe base64, no padding)
pub const TOKEN_LENGTH: usize = 43;

/// Generates a fresh bearer token for `user_id` that expires after `ttl`.
/// Nothing is persisted here.
#[instrument]
pub fn generate(user_id: i32, ttl: Duration) -> TokenModel {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut buf);
    let plaintext = URL_SAFE_NO_PAD.encode(buf);
    let token_hash = hash_token(&plaintext);

    debug!(ttl_secs = ttl.num_seconds(), "Generated bearer token");

    TokenModel::new(user_id, plaintext, token_hash, ttl)
}

/// SHA-256 digest of a plaintext token, the only form that is stored
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("no authorization header received".to_string())
        })?
        .to_str()
        .map_err(|_| AppError::Unauthorized("no valid authorization header received".to_string()))?;

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        warn!("Invalid Authorization header format (expected Bearer token)");
        return Err(AppError::Unauthorized(
            "no valid authorization header received".to_string(),
        ));
    }

    let token = parts[1];
    if token.len() != TOKEN_LENGTH {
        warn!(length = token.len(), "Bearer token has the wrong size");
        return Err(AppError::Unauthorized("token wrong size".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[test]
    fn test_generated_token_shape() {
        let token = generate(7, Duration::hours(24));
        assert_eq!(token.user_id, 7);
        assert_eq!(token.token.len(), TOKEN_LENGTH);
        assert_eq!(token.token_hash, hash_token(&token.token));
        assert_eq!(token.token_hash.len(), 32);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let first = generate(1, Duration::hours(1));
        let second = generate(1, Duration::hours(1));
        assert_ne!(first.token, second.token);
        assert_ne!(first.token_hash, second.token_hash);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn test_bearer_token_accepted() {
        let token = generate(1, Duration::hours(1)).token;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(bearer_token(&headers).unwrap(), token);
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[rstest]
    #[case("Bearer")]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("bearer AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")]
    #[case("Bearer short")]
    #[case("Bearer AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA extra")]
    fn test_malformed_headers_rejected(#[case] value: &str) {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());

        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
