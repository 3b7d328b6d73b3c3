//! Axum route handlers for the Auth API.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::extractors::{AuthUser, MaybeAuthUser};
use crate::auth::password::verify_password_blocking;
use crate::auth::registration::{
    register_account, register_company, validate, AccountRole, RegisterRequest, Registration,
    UserType,
};
use crate::auth::verification::{
    check_code, delete_code, find_code, generate_code, is_valid_code_format,
    record_failed_attempt, upsert_code, CodeRejection,
};
use crate::email::verification_email;
use crate::errors::AppError;
use crate::models::account::{AccountRow, AccountSummary, ProfileRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub user: AccountSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address or username.
    #[serde(alias = "email", alias = "username")]
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AddressView {
    pub premise: Option<String>,
    pub street: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub company_id: Option<i32>,
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub employee_id: Option<i32>,
    pub account_type: String,
    pub user_type: &'static str,
    pub is_verified: bool,
    pub is_job_seeker: bool,
    pub is_employee: bool,
    pub address: AddressView,
    pub nationality: Option<String>,
}

impl From<ProfileRow> for MeResponse {
    fn from(row: ProfileRow) -> Self {
        let user_type = if row.account_type_name == "Company" {
            "employer"
        } else {
            "job-seeker"
        };
        MeResponse {
            id: row.account_id,
            username: row.account_username,
            email: row.account_email,
            phone: row.account_phone,
            first_name: row.first_name,
            last_name: row.last_name,
            middle_name: row.middle_name,
            company_id: row.company_id,
            company_name: row.company_name,
            position: row.position_name,
            employee_id: row.employee_id,
            account_type: row.account_type_name,
            user_type,
            is_verified: row.account_is_verified,
            is_job_seeker: row.job_seeker_id.is_some(),
            is_employee: row.employee_id.is_some(),
            address: AddressView {
                premise: row.premise_name,
                street: row.street_name,
                barangay: row.barangay_name,
                city: row.city_name,
            },
            nationality: row.nationality_name,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = validate(req)?;

    let response = match registration {
        Registration::Company(reg) => {
            let company_id = register_company(&state.db, &reg).await?;
            RegisterResponse {
                message: format!("Company registration successful! Your company ID is {company_id}"),
                user_type: UserType::Company.as_str(),
                user_id: None,
                company_id: Some(company_id),
                email_sent: None,
            }
        }
        Registration::Account(reg) => {
            let ttl = state.config.verification_code_ttl_minutes;
            let created = register_account(&state.db, &reg, ttl).await?;
            let email = verification_email(&reg.email, &reg.username, &created.verification_code, ttl);
            let email_sent = match state.mailer.send(email).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Verification email to account {} failed: {e}", created.account_id);
                    false
                }
            };
            RegisterResponse {
                message: "Registration successful! Please check your email for verification."
                    .to_string(),
                user_type: match reg.role {
                    AccountRole::JobSeeker => UserType::JobSeeker.as_str(),
                    AccountRole::Employee { .. } => UserType::Employee.as_str(),
                },
                user_id: Some(created.account_id),
                company_id: None,
                email_sent: Some(email_sent),
            }
        }
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let (Some(email), Some(code)) = (req.email, req.code) else {
        return Err(AppError::Validation(
            "Email and verification code are required".to_string(),
        ));
    };
    if !is_valid_code_format(&code) {
        return Err(AppError::Validation(
            "Invalid verification code format".to_string(),
        ));
    }

    let mut account = find_account_by_email(&state, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if account.account_is_verified {
        return Err(AppError::Validation("Account already verified".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let stored = find_code(&mut *tx, account.account_id).await?;
    if let Err(rejection) = check_code(stored.as_ref(), &code, Utc::now()) {
        if rejection == CodeRejection::Mismatch {
            record_failed_attempt(&mut *tx, account.account_id).await?;
            tx.commit().await?;
            warn!("Wrong verification code for account {}", account.account_id);
        }
        return Err(rejection.into());
    }

    sqlx::query("UPDATE account SET account_is_verified = TRUE WHERE account_id = $1")
        .bind(account.account_id)
        .execute(&mut *tx)
        .await?;
    delete_code(&mut *tx, account.account_id).await?;
    tx.commit().await?;

    account.account_is_verified = true;
    info!("Account {} verified", account.account_id);

    let token = state.jwt.issue(
        account.account_id,
        &account.account_email,
        &account.account_username,
    )?;
    Ok(Json(TokenResponse {
        message: "Email verified successfully".to_string(),
        token,
        user: AccountSummary::from(&account),
    }))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let (Some(login), Some(password)) = (req.login, req.password) else {
        return Err(AppError::Validation(
            "Username or email and password are required".to_string(),
        ));
    };

    let account: Option<AccountRow> = sqlx::query_as(
        r#"
        SELECT account_id, account_email, account_username, account_password,
               account_is_verified, account_created_at
        FROM account
        WHERE account_email = $1 OR account_username = $1
        ORDER BY (account_email = $1) DESC
        LIMIT 1
        "#,
    )
    .bind(login.trim())
    .fetch_optional(&state.db)
    .await?;

    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());
    let account = account.ok_or_else(invalid)?;
    if !verify_password_blocking(password, account.account_password.clone()).await? {
        warn!("Failed login for account {}", account.account_id);
        return Err(invalid());
    }
    if !account.account_is_verified {
        return Err(AppError::Forbidden(
            "Please verify your email before logging in".to_string(),
        ));
    }

    let token = state.jwt.issue(
        account.account_id,
        &account.account_email,
        &account.account_username,
    )?;
    Ok(Json(TokenResponse {
        message: "Login successful".to_string(),
        token,
        user: AccountSummary::from(&account),
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let row: Option<ProfileRow> = sqlx::query_as(
        r#"
        SELECT
            a.account_id, a.account_username, a.account_email, a.account_phone,
            a.account_is_verified, at.account_type_name,
            p.first_name, p.last_name, p.middle_name,
            addr.premise_name, addr.street_name, addr.barangay_name, addr.city_name,
            n.nationality_name,
            c.company_id, c.company_name,
            e.position_name, e.employee_id,
            js.job_seeker_id
        FROM account a
        JOIN account_type at ON a.account_type_id = at.account_type_id
        LEFT JOIN job_seeker js ON a.account_id = js.account_id
        LEFT JOIN employee e ON a.account_id = e.account_id
        LEFT JOIN person p ON p.person_id = COALESCE(js.person_id, e.person_id)
        LEFT JOIN address addr ON p.address_id = addr.address_id
        LEFT JOIN nationality n ON p.nationality_id = n.nationality_id
        LEFT JOIN company c ON e.company_id = c.company_id
        WHERE a.account_id = $1
        "#,
    )
    .bind(user.account_id)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(row.into()))
}

/// POST /api/auth/resend-code
pub async fn handle_resend_code(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = req
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
    reissue_code(&state, &email).await?;
    Ok(Json(MessageResponse {
        message: "Verification code sent successfully".to_string(),
    }))
}

/// POST /api/auth/resend-verification
/// The session's email, when present, takes precedence over the body.
pub async fn handle_resend_verification(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(req): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = user
        .map(|u| u.email)
        .or(req.email)
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
    reissue_code(&state, &email).await?;
    Ok(Json(MessageResponse {
        message: "Verification email sent successfully".to_string(),
    }))
}

async fn reissue_code(state: &AppState, email: &str) -> Result<(), AppError> {
    let account = find_account_by_email(state, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if account.account_is_verified {
        return Err(AppError::Validation("Account already verified".to_string()));
    }

    let ttl = state.config.verification_code_ttl_minutes;
    let code = generate_code();
    upsert_code(&state.db, account.account_id, &code, ttl).await?;

    let message = verification_email(&account.account_email, &account.account_username, &code, ttl);
    state.mailer.send(message).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to send verification email: {e}"))
    })?;
    info!("Reissued verification code for account {}", account.account_id);
    Ok(())
}

async fn find_account_by_email(state: &AppState, email: &str) -> Result<Option<AccountRow>, AppError> {
    Ok(sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT account_id, account_email, account_username, account_password,
               account_is_verified, account_created_at
        FROM account
        WHERE account_email = $1
        "#,
    )
    .bind(email.trim())
    .fetch_optional(&state.db)
    .await?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    use crate::auth::jwt::JwtKeys;
    use crate::auth::verification::MAX_FAILED_ATTEMPTS;
    use crate::config::Config;
    use crate::test_support::{app, mark_verified, post_json, seed_job_seeker, send, PASSWORD};

    fn keys() -> JwtKeys {
        let config = Config::for_tests();
        JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours)
    }

    async fn login(pool: &PgPool, login: &str) -> (StatusCode, serde_json::Value) {
        let body = json!({ "login": login, "password": PASSWORD });
        send(app(pool.clone()), post_json("/api/auth/login", None, body)).await
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_verify_issues_token_for_account(pool: PgPool) {
        let seeker = seed_job_seeker(&pool, "ana@example.com", "ana").await;
        let body = json!({ "email": "ana@example.com", "code": seeker.verification_code });
        let (status, body) = send(app(pool.clone()), post_json("/api/auth/verify", None, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["isVerified"], true);

        let claims = keys().verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.user_id, seeker.account_id);
        assert_eq!(claims.username, "ana");

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_codes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_wrong_codes_exhaust_the_code(pool: PgPool) {
        let seeker = seed_job_seeker(&pool, "ana@example.com", "ana").await;
        let wrong = if seeker.verification_code == "111111" { "222222" } else { "111111" };

        for _ in 0..MAX_FAILED_ATTEMPTS {
            let body = json!({ "email": "ana@example.com", "code": wrong });
            let (status, body) =
                send(app(pool.clone()), post_json("/api/auth/verify", None, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["message"], "Invalid verification code");
        }

        let body = json!({ "email": "ana@example.com", "code": seeker.verification_code });
        let (status, body) = send(app(pool.clone()), post_json("/api/auth/verify", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Too many incorrect attempts. Please request a new code"
        );

        // A fresh code starts a fresh count.
        let body = json!({ "email": "ana@example.com" });
        let (status, _) = send(app(pool.clone()), post_json("/api/auth/resend-code", None, body)).await;
        assert_eq!(status, StatusCode::OK);
        let code: String =
            sqlx::query_scalar("SELECT code FROM verification_codes WHERE account_id = $1")
                .bind(seeker.account_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        let body = json!({ "email": "ana@example.com", "code": code });
        let (status, _) = send(app(pool), post_json("/api/auth/verify", None, body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_issues_token_for_account(pool: PgPool) {
        let seeker = seed_job_seeker(&pool, "ana@example.com", "ana").await;
        mark_verified(&pool, seeker.account_id).await;

        for name in ["ana@example.com", "ana"] {
            let (status, body) = login(&pool, name).await;
            assert_eq!(status, StatusCode::OK, "{name}");
            let claims = keys().verify(body["token"].as_str().unwrap()).unwrap();
            assert_eq!(claims.user_id, seeker.account_id, "{name}");
            assert_eq!(claims.email, "ana@example.com");
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_rejections(pool: PgPool) {
        let seeker = seed_job_seeker(&pool, "ana@example.com", "ana").await;

        let (status, _) = login(&pool, "ana").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        mark_verified(&pool, seeker.account_id).await;
        let body = json!({ "login": "ana", "password": "not-the-password" });
        let (status, _) = send(app(pool.clone()), post_json("/api/auth/login", None, body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = login(&pool, "nobody").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_prefers_email_over_username(pool: PgPool) {
        let owner = seed_job_seeker(&pool, "bob@example.com", "bob").await;
        let other = seed_job_seeker(&pool, "other@example.com", "bob@example.com").await;
        mark_verified(&pool, owner.account_id).await;
        mark_verified(&pool, other.account_id).await;

        let (status, body) = login(&pool, "bob@example.com").await;
        assert_eq!(status, StatusCode::OK);
        let claims = keys().verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.user_id, owner.account_id);
    }
}
