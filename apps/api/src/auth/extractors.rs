//! Request extractors for bearer-token authentication and role checks.
//!
//! Roles are not stored in the token: a job seeker is an account with a
//! `job_seeker` row, an employee one with an `employee` row.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::jwt::SessionClaims;
use crate::errors::AppError;
use crate::state::AppState;

/// Any holder of a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: i32,
    pub email: String,
    pub username: String,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            account_id: claims.user_id,
            email: claims.email,
            username: claims.username,
        }
    }
}

/// Authentication is optional; an invalid token is treated as a guest.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[derive(Debug, Clone)]
pub struct JobSeekerUser {
    pub account_id: i32,
    pub job_seeker_id: i32,
    pub person_id: i32,
}

#[derive(Debug, Clone)]
pub struct EmployeeUser {
    pub employee_id: i32,
    pub company_id: i32,
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(AppError::unauthorized)?;
        Ok(state.jwt.verify(token)?.into())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts)
            .and_then(|token| state.jwt.verify(token).ok())
            .map(AuthUser::from);
        Ok(MaybeAuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for JobSeekerUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let row: Option<(i32, i32)> =
            sqlx::query_as("SELECT job_seeker_id, person_id FROM job_seeker WHERE account_id = $1")
                .bind(user.account_id)
                .fetch_optional(&state.db)
                .await?;
        let (job_seeker_id, person_id) = row.ok_or_else(|| {
            AppError::Forbidden("This action is only available to job seekers".to_string())
        })?;
        Ok(JobSeekerUser {
            account_id: user.account_id,
            job_seeker_id,
            person_id,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for EmployeeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let row: Option<(i32, i32)> =
            sqlx::query_as("SELECT employee_id, company_id FROM employee WHERE account_id = $1")
                .bind(user.account_id)
                .fetch_optional(&state.db)
                .await?;
        let (employee_id, company_id) = row.ok_or_else(|| {
            AppError::Forbidden("This action is only available to company employees".to_string())
        })?;
        Ok(EmployeeUser {
            employee_id,
            company_id,
        })
    }
}

/// Resolves the job seeker id behind an optional session, for follow/applied flags.
pub async fn job_seeker_id_for(
    state: &AppState,
    user: &Option<AuthUser>,
) -> Result<Option<i32>, AppError> {
    let Some(user) = user else {
        return Ok(None);
    };
    Ok(
        sqlx::query_scalar("SELECT job_seeker_id FROM job_seeker WHERE account_id = $1")
            .bind(user.account_id)
            .fetch_optional(&state.db)
            .await?,
    )
}
