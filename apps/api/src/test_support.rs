//! Fixtures for tests that run against a migrated database
//! (`#[sqlx::test(migrations = "./migrations")]`).

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use crate::auth::jwt::JwtKeys;
use crate::auth::registration::{
    register_account, validate, AccountRegistration, RegisterRequest, Registration,
};
use crate::config::Config;
use crate::email::LogMailer;
use crate::jobs::recommendation::PreferenceRecommender;
use crate::routes::build_router;
use crate::state::AppState;

pub const PASSWORD: &str = "supersecret";

pub fn state(db: PgPool) -> AppState {
    let config = Config::for_tests();
    AppState {
        db,
        jwt: JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
        config,
        mailer: Arc::new(LogMailer),
        recommender: Arc::new(PreferenceRecommender),
    }
}

pub fn app(db: PgPool) -> Router {
    build_router(state(db))
}

pub fn job_seeker_request(email: &str, username: &str) -> RegisterRequest {
    RegisterRequest {
        user_type: Some("job-seeker".into()),
        first_name: Some("Ana".into()),
        last_name: Some("Reyes".into()),
        email: Some(email.into()),
        username: Some(username.into()),
        password: Some(PASSWORD.into()),
        confirm_password: Some(PASSWORD.into()),
        ..Default::default()
    }
}

pub fn job_seeker_registration(email: &str, username: &str) -> AccountRegistration {
    match validate(job_seeker_request(email, username)) {
        Ok(Registration::Account(reg)) => reg,
        other => panic!("expected an account registration, got {other:?}"),
    }
}

pub struct SeededSeeker {
    pub account_id: i32,
    pub job_seeker_id: i32,
    pub person_id: i32,
    pub verification_code: String,
}

/// Registers a job seeker through the normal registration path.
pub async fn seed_job_seeker(pool: &PgPool, email: &str, username: &str) -> SeededSeeker {
    let reg = job_seeker_registration(email, username);
    let created = register_account(pool, &reg, 10)
        .await
        .unwrap_or_else(|e| panic!("registering {email}: {e:?}"));
    let (job_seeker_id, person_id): (i32, i32) =
        sqlx::query_as("SELECT job_seeker_id, person_id FROM job_seeker WHERE account_id = $1")
            .bind(created.account_id)
            .fetch_one(pool)
            .await
            .unwrap();
    SeededSeeker {
        account_id: created.account_id,
        job_seeker_id,
        person_id,
        verification_code: created.verification_code,
    }
}

pub async fn mark_verified(pool: &PgPool, account_id: i32) {
    sqlx::query("UPDATE account SET account_is_verified = TRUE WHERE account_id = $1")
        .bind(account_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_company(pool: &PgPool, name: &str, rating: Option<f64>) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO company (company_name, company_email, company_rating)
        VALUES ($1, $2, $3)
        RETURNING company_id
        "#,
    )
    .bind(name)
    .bind(format!("{}@company.test", name.to_lowercase().replace(' ', "-")))
    .bind(rating)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Id of one of the seeded reference categories.
pub async fn category_id(pool: &PgPool, name: &str) -> i32 {
    sqlx::query_scalar("SELECT job_category_id FROM job_category WHERE job_category_name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// An active full-time job posted `days_ago` days ago.
pub async fn seed_job(
    pool: &PgPool,
    company_id: i32,
    name: &str,
    category_ids: &[i32],
    days_ago: i32,
) -> i32 {
    let job_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO job (company_id, job_type_id, job_name, job_description, job_posted_date)
        SELECT $1, job_type_id, $2, 'Role description', NOW() - make_interval(days => $3)
        FROM job_type WHERE job_type_name = 'Full-time'
        RETURNING job_id
        "#,
    )
    .bind(company_id)
    .bind(name)
    .bind(days_ago)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO job_category_list (job_id, job_category_id) SELECT $1, UNNEST($2::int[])",
    )
    .bind(job_id)
    .bind(category_ids)
    .execute(pool)
    .await
    .unwrap();
    job_id
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
