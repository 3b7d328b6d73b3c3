pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::companies::{handlers as companies, ratings};
use crate::employee::handlers as employee;
use crate::jobs::handlers as jobs;
use crate::jobseeker::handlers as jobseeker;
use crate::notifications::handlers as notifications;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/verify", post(auth::handle_verify))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        .route("/api/auth/resend-code", post(auth::handle_resend_code))
        .route(
            "/api/auth/resend-verification",
            post(auth::handle_resend_verification),
        )
        // Jobs
        .route("/api/jobs/search", get(jobs::handle_search))
        .route("/api/jobs/recommended", get(jobs::handle_recommended))
        .route("/api/jobs/apply", post(jobs::handle_apply))
        .route("/api/jobs/save", post(jobs::handle_toggle_saved))
        .route("/api/jobs/saved", get(jobs::handle_saved_jobs))
        .route("/api/jobs/:id", get(jobs::handle_job_detail))
        .route("/api/job-categories", get(jobs::handle_job_categories))
        // Companies
        .route("/api/companies", get(companies::handle_list))
        .route("/api/companies/follow", post(companies::handle_follow))
        .route("/api/companies/:id", get(companies::handle_detail))
        .route("/api/companies/:id/rate", post(ratings::handle_rate))
        .route("/api/companies/:id/rating", get(ratings::handle_my_rating))
        // Profile
        .route("/api/profile/update", post(profile::handle_update_profile))
        .route(
            "/api/job-preferences",
            get(profile::handle_get_preferences).post(profile::handle_save_preferences),
        )
        .route("/api/nationalities", get(profile::handle_nationalities))
        // Employer dashboard
        .route("/api/employee/job-history", get(employee::handle_job_history))
        .route("/api/employee/applications", get(employee::handle_applications))
        .route(
            "/api/employee/applications/respond",
            post(employee::handle_respond),
        )
        .route("/api/employee/jobs", post(employee::handle_create_job))
        .route(
            "/api/employee/toggle-job-status",
            post(employee::handle_toggle_job_status),
        )
        .route("/api/employee/stats", get(employee::handle_stats))
        // Job seeker
        .route(
            "/api/jobseeker/applications",
            get(jobseeker::handle_applications),
        )
        // Notifications
        .route("/api/notifications", get(notifications::handle_list))
        .route(
            "/api/notifications/:id/read",
            post(notifications::handle_mark_read),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::Config;
    use crate::test_support::{get, post_json, send, state};

    /// Router over a pool that never connects; only paths rejected before
    /// any query runs are exercised here.
    fn test_app() -> Router {
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&Config::for_tests().database_url)
            .unwrap();
        build_router(state(db))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(test_app(), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobboard-api");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let (status, body) = send(test_app(), get("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Authorization token required");
    }

    #[tokio::test]
    async fn test_me_rejects_garbage_token() {
        let (status, body) = send(test_app(), get("/api/auth/me", Some("not-a-jwt"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for uri in [
            "/api/jobs/recommended",
            "/api/jobs/saved",
            "/api/notifications",
            "/api/employee/stats",
            "/api/jobseeker/applications",
        ] {
            let (status, _) = send(test_app(), get(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_apply_requires_token() {
        let (status, _) = send(
            test_app(),
            post_json("/api/jobs/apply", None, json!({ "jobId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let body = json!({
            "userType": "job-seeker",
            "firstName": "Ana", "lastName": "Santos",
            "email": "ana@example.com", "username": "ana",
            "password": "password123", "confirmPassword": "password124"
        });
        let (status, body) = send(test_app(), post_json("/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_unknown_user_type() {
        let body = json!({ "userType": "admin", "email": "x@example.com" });
        let (status, _) = send(test_app(), post_json("/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_code() {
        let body = json!({ "email": "ana@example.com", "code": "12ab" });
        let (status, body) = send(test_app(), post_json("/api/auth/verify", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid verification code format");
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let body = json!({ "login": "ana" });
        let (status, _) = send(test_app(), post_json("/api/auth/login", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
