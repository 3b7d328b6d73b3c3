use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Stored password could not be parsed: {0}")]
    StoredHashUnparseable(argon2::password_hash::Error),
    #[error("Password hash failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("Password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for crate::errors::AppError {
    fn from(e: PasswordError) -> Self {
        crate::errors::AppError::Internal(anyhow::anyhow!(e))
    }
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(PasswordError::Hash)
}

/// Returns `Ok(false)` on mismatch; errors only when the stored hash is corrupt.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::StoredHashUnparseable)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?
}
