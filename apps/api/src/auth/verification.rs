use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::{FromRow, PgExecutor};
use thiserror::Error;

use crate::errors::AppError;

pub const CODE_LEN: usize = 6;
/// Wrong guesses allowed per issued code; a new code resets the count.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone, FromRow)]
pub struct VerificationCodeRow {
    pub account_id: i32,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub failed_attempts: i32,
}

#[derive(Debug, Error, PartialEq)]
pub enum CodeRejection {
    #[error("No verification code issued. Please request a new one")]
    Missing,
    #[error("Verification code has expired. Please request a new one")]
    Expired,
    #[error("Too many incorrect attempts. Please request a new code")]
    AttemptsExhausted,
    #[error("Invalid verification code")]
    Mismatch,
}

impl From<CodeRejection> for AppError {
    fn from(e: CodeRejection) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Uniform 6-digit code in 100000..=999999.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

pub fn is_valid_code_format(code: &str) -> bool {
    code.len() == CODE_LEN && code.chars().all(|c| c.is_ascii_digit())
}

/// Checks a submitted code against the stored one. Only `Mismatch` counts
/// as a failed attempt.
pub fn check_code(
    stored: Option<&VerificationCodeRow>,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), CodeRejection> {
    let stored = stored.ok_or(CodeRejection::Missing)?;
    if stored.failed_attempts >= MAX_FAILED_ATTEMPTS {
        return Err(CodeRejection::AttemptsExhausted);
    }
    if stored.expires_at <= now {
        return Err(CodeRejection::Expired);
    }
    if stored.code != submitted {
        return Err(CodeRejection::Mismatch);
    }
    Ok(())
}

/// Replaces any outstanding code for the account.
pub async fn upsert_code<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: i32,
    code: &str,
    ttl_minutes: i64,
) -> Result<(), sqlx::Error> {
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
    sqlx::query(
        r#"
        INSERT INTO verification_codes (account_id, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (account_id) DO UPDATE
        SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at,
            created_at = NOW(), failed_attempts = 0
        "#,
    )
    .bind(account_id)
    .bind(code)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Locks the row, so concurrent guesses are counted one at a time.
pub async fn find_code<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: i32,
) -> Result<Option<VerificationCodeRow>, sqlx::Error> {
    sqlx::query_as::<_, VerificationCodeRow>(
        r#"
        SELECT account_id, code, expires_at, created_at, failed_attempts
        FROM verification_codes
        WHERE account_id = $1
        FOR UPDATE
        "#,
    )
    .bind(account_id)
    .fetch_optional(executor)
    .await
}

pub async fn record_failed_attempt<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE verification_codes SET failed_attempts = failed_attempts + 1 WHERE account_id = $1",
    )
    .bind(account_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_code<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM verification_codes WHERE account_id = $1")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(())
}
