use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Custom claims carried by every session token, next to the standard
/// `iat`/`exp` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: i32,
    pub email: String,
    pub username: String,
}

/// HS256 signing key, built once at startup from `JWT_SECRET`.
#[derive(Clone)]
pub struct JwtKeys {
    key: HS256Key,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
            ttl: Duration::from_hours(ttl_hours),
        }
    }

    pub fn issue(&self, account_id: i32, email: &str, username: &str) -> Result<String, AppError> {
        let claims = Claims::with_custom_claims(
            SessionClaims {
                user_id: account_id,
                email: email.to_string(),
                username: username.to_string(),
            },
            self.ttl,
        );
        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        self.key
            .verify_token::<SessionClaims>(token, None)
            .map(|claims| claims.custom)
            .map_err(|e| {
                tracing::debug!("Rejected token: {e}");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}
