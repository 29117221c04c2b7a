use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use tracing::warn;

use crate::shared::AppError;

/// Hashes a plaintext password into an Argon2id PHC string with a fresh salt
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::Internal(format!("password hashing failed: {}", e))
        })
}

/// Checks a plaintext password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; an unreadable hash or any other hashing
/// failure is an internal error.
pub fn password_matches(plaintext: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        warn!(error = %e, "Stored password hash could not be parsed");
        AppError::Internal(format!("unreadable password hash: {}", e))
    })?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => {
            warn!(error = %e, "Password verification failed");
            Err(AppError::Internal(format!(
                "password verification failed: {}",
                e
            )))
        }
    }
}
