//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::extractors::{job_seeker_id_for, AuthUser, JobSeekerUser, MaybeAuthUser};
use crate::errors::{is_unique_violation, AppError};
use crate::jobs::recommendation::{fetch_candidates, fetch_preferred_categories, RecommendedJob};
use crate::jobs::search::{clamp_limit, search_jobs, LimitQuery, SearchQuery};
use crate::models::deserialize_optional_id;
use crate::models::job::{CompanySummary, JobCategoryRow, JobListingRow, JobRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailResponse {
    pub job: JobRow,
    pub company: CompanySummary,
    pub categories: Vec<JobCategoryRow>,
    pub has_applied: bool,
    pub is_saved: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyRequest {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub job_id: Option<i32>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub message: String,
    pub request_id: i32,
    pub request_date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobIdRequest {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub job_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobResponse {
    pub message: String,
    pub is_saved: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    Ok(Json(search_jobs(&state.db, &query).await?))
}

/// GET /api/jobs/recommended
pub async fn handle_recommended(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecommendedJob>>, AppError> {
    let limit = clamp_limit(query.limit);
    let preferred = fetch_preferred_categories(&state.db, user.account_id).await?;
    let candidates = fetch_candidates(&state.db, &preferred, limit).await?;
    Ok(Json(state.recommender.rank(candidates, &preferred, limit as usize)))
}

/// GET /api/jobs/:id
pub async fn handle_job_detail(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = fetch_job(&state, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let company: CompanySummary = sqlx::query_as(
        r#"
        SELECT company_id, company_name, company_description, company_website, company_rating
        FROM company WHERE company_id = $1
        "#,
    )
    .bind(job.company_id)
    .fetch_one(&state.db)
    .await?;

    let categories: Vec<JobCategoryRow> = sqlx::query_as(
        r#"
        SELECT jc.job_category_id, jc.job_category_name
        FROM job_category_list jcl
        JOIN job_category jc ON jcl.job_category_id = jc.job_category_id
        WHERE jcl.job_id = $1
        ORDER BY jc.job_category_name
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    let (has_applied, is_saved) = match job_seeker_id_for(&state, &user).await? {
        Some(job_seeker_id) => sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM job_requests WHERE job_id = $1 AND job_seeker_id = $2),
                EXISTS (SELECT 1 FROM saved_jobs WHERE job_id = $1 AND job_seeker_id = $2)
            "#,
        )
        .bind(job_id)
        .bind(job_seeker_id)
        .fetch_one(&state.db)
        .await?,
        None => (false, false),
    };

    Ok(Json(JobDetailResponse {
        job,
        company,
        categories,
        has_applied,
        is_saved,
    }))
}

/// POST /api/jobs/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
    Json(req): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let job_id = req
        .job_id
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;

    let job = fetch_job(&state, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    if !is_accepting_applications(&job, Utc::now()) {
        return Err(AppError::Validation(
            "This job is no longer accepting applications".to_string(),
        ));
    }

    let existing: Option<i32> = sqlx::query_scalar(
        "SELECT request_id FROM job_requests WHERE job_id = $1 AND job_seeker_id = $2",
    )
    .bind(job_id)
    .bind(seeker.job_seeker_id)
    .fetch_optional(&state.db)
    .await?;
    if existing.is_some() {
        return Err(already_applied());
    }

    let cover_letter = req.cover_letter.filter(|c| !c.trim().is_empty());
    let (request_id, request_date) =
        insert_application(&state.db, job_id, seeker.job_seeker_id, cover_letter).await?;

    info!(
        "Account {} (job seeker {}) applied to job {job_id}, request {request_id}",
        seeker.account_id, seeker.job_seeker_id
    );
    Ok(Json(ApplyResponse {
        message: "Job application submitted successfully".to_string(),
        request_id,
        request_date,
    }))
}

/// POST /api/jobs/save
pub async fn handle_toggle_saved(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
    Json(req): Json<JobIdRequest>,
) -> Result<Json<SaveJobResponse>, AppError> {
    let job_id = req
        .job_id
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;
    let exists: Option<i32> = sqlx::query_scalar("SELECT job_id FROM job WHERE job_id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let removed = sqlx::query("DELETE FROM saved_jobs WHERE job_id = $1 AND job_seeker_id = $2")
        .bind(job_id)
        .bind(seeker.job_seeker_id)
        .execute(&state.db)
        .await?
        .rows_affected();

    if removed > 0 {
        return Ok(Json(SaveJobResponse {
            message: "Job removed from saved jobs".to_string(),
            is_saved: false,
        }));
    }

    sqlx::query(
        "INSERT INTO saved_jobs (job_id, job_seeker_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(job_id)
    .bind(seeker.job_seeker_id)
    .execute(&state.db)
    .await?;
    Ok(Json(SaveJobResponse {
        message: "Job saved successfully".to_string(),
        is_saved: true,
    }))
}

/// GET /api/jobs/saved
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobListingRow>(
        r#"
        SELECT
            j.job_id, j.company_id, c.company_name, c.company_rating, jt.job_type_name,
            j.job_name, j.job_description, j.job_location, j.job_salary, j.job_time,
            j.job_is_active, j.job_posted_date, j.job_closing_date
        FROM saved_jobs sj
        JOIN job j ON sj.job_id = j.job_id
        JOIN company c ON j.company_id = c.company_id
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE sj.job_seeker_id = $1
        ORDER BY sj.saved_at DESC
        "#,
    )
    .bind(seeker.job_seeker_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// GET /api/job-categories
pub async fn handle_job_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobCategoryRow>>, AppError> {
    let categories = sqlx::query_as::<_, JobCategoryRow>(
        "SELECT job_category_id, job_category_name FROM job_category ORDER BY job_category_name ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(categories))
}

pub(crate) async fn fetch_job(state: &AppState, job_id: i32) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        SELECT j.job_id, j.company_id, j.job_type_id, jt.job_type_name, j.job_name,
               j.job_description, j.job_location, j.job_salary, j.job_time, j.job_rating,
               j.job_is_active, j.job_posted_date, j.job_closing_date
        FROM job j
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE j.job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(&state.db)
    .await
}

/// A concurrent duplicate that slipped past the pre-check still maps to 409.
pub(crate) async fn insert_application(
    pool: &PgPool,
    job_id: i32,
    job_seeker_id: i32,
    cover_letter: Option<String>,
) -> Result<(i32, DateTime<Utc>), AppError> {
    sqlx::query_as(
        r#"
        INSERT INTO job_requests (job_id, job_seeker_id, cover_letter)
        VALUES ($1, $2, $3)
        RETURNING request_id, request_date
        "#,
    )
    .bind(job_id)
    .bind(job_seeker_id)
    .bind(cover_letter)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            already_applied()
        } else {
            AppError::Database(e)
        }
    })
}

/// Open means active and not past its closing date.
pub fn is_accepting_applications(job: &JobRow, now: DateTime<Utc>) -> bool {
    job.job_is_active && job.job_closing_date.map_or(true, |closing| closing > now)
}

fn already_applied() -> AppError {
    AppError::Conflict("You have already applied for this job".to_string())
}
