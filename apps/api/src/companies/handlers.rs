//! Axum route handlers for company listings, company pages and follows.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::extractors::{job_seeker_id_for, JobSeekerUser, MaybeAuthUser};
use crate::errors::AppError;
use crate::models::company::{CompanyDetail, CompanyJobView, CompanyListItem, CompanyRecord};
use crate::models::deserialize_optional_id;
use crate::models::job::{CompanyJobRow, JobCategoryLink, JobCategoryRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FollowRequest {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub company_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub message: String,
    pub is_following: bool,
}

/// GET /api/companies
pub async fn handle_list(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Vec<CompanyListItem>>, AppError> {
    let seeker = job_seeker_id_for(&state, &user).await?;
    let companies = fetch_companies(&state.db, seeker, None).await?;
    Ok(Json(companies.into_iter().map(CompanyListItem::from).collect()))
}

/// GET /api/companies/:id
pub async fn handle_detail(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<CompanyDetail>, AppError> {
    let seeker = job_seeker_id_for(&state, &user).await?;
    let company = fetch_companies(&state.db, seeker, Some(company_id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    let jobs: Vec<CompanyJobRow> = sqlx::query_as(
        r#"
        SELECT
            j.job_id, j.company_id, j.job_type_id, jt.job_type_name, j.job_name,
            j.job_description, j.job_location, j.job_salary, j.job_time, j.job_rating,
            j.job_is_active, j.job_posted_date, j.job_closing_date,
            ($2::int IS NOT NULL AND EXISTS (
                SELECT 1 FROM job_requests jr
                WHERE jr.job_id = j.job_id AND jr.job_seeker_id = $2)) AS has_applied,
            ($2::int IS NOT NULL AND EXISTS (
                SELECT 1 FROM saved_jobs sj
                WHERE sj.job_id = j.job_id AND sj.job_seeker_id = $2)) AS is_saved
        FROM job j
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE j.company_id = $1
        ORDER BY j.job_posted_date DESC, j.job_id DESC
        "#,
    )
    .bind(company_id)
    .bind(seeker)
    .fetch_all(&state.db)
    .await?;

    let job_ids: Vec<i32> = jobs.iter().map(|j| j.job.job_id).collect();
    let links: Vec<JobCategoryLink> = sqlx::query_as(
        r#"
        SELECT jcl.job_id, jc.job_category_id, jc.job_category_name
        FROM job_category_list jcl
        JOIN job_category jc ON jcl.job_category_id = jc.job_category_id
        WHERE jcl.job_id = ANY($1)
        ORDER BY jc.job_category_name
        "#,
    )
    .bind(job_ids.as_slice())
    .fetch_all(&state.db)
    .await?;

    let mut categories = group_categories(links);
    let jobs = jobs
        .into_iter()
        .map(|job| CompanyJobView {
            categories: categories.remove(&job.job.job_id).unwrap_or_default(),
            job,
        })
        .collect();

    Ok(Json(CompanyDetail::new(company, jobs)))
}

/// POST /api/companies/follow
pub async fn handle_follow(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
    Json(req): Json<FollowRequest>,
) -> Result<Json<FollowResponse>, AppError> {
    let company_id = req
        .company_id
        .ok_or_else(|| AppError::Validation("Company ID is required".to_string()))?;
    ensure_company_exists(&state.db, company_id).await?;

    let removed = sqlx::query(
        "DELETE FROM followed_companies WHERE company_id = $1 AND job_seeker_id = $2",
    )
    .bind(company_id)
    .bind(seeker.job_seeker_id)
    .execute(&state.db)
    .await?
    .rows_affected();

    if removed > 0 {
        info!("Job seeker {} unfollowed company {company_id}", seeker.job_seeker_id);
        return Ok(Json(FollowResponse {
            message: "Company unfollowed successfully".to_string(),
            is_following: false,
        }));
    }

    sqlx::query(
        r#"
        INSERT INTO followed_companies (company_id, job_seeker_id)
        VALUES ($1, $2)
        ON CONFLICT (company_id, job_seeker_id) DO NOTHING
        "#,
    )
    .bind(company_id)
    .bind(seeker.job_seeker_id)
    .execute(&state.db)
    .await?;

    info!("Job seeker {} followed company {company_id}", seeker.job_seeker_id);
    Ok(Json(FollowResponse {
        message: "Company followed successfully".to_string(),
        is_following: true,
    }))
}

/// All companies ordered by name, or the single company `only` when given.
async fn fetch_companies(
    pool: &PgPool,
    job_seeker_id: Option<i32>,
    only: Option<i32>,
) -> Result<Vec<CompanyRecord>, sqlx::Error> {
    sqlx::query_as::<_, CompanyRecord>(
        r#"
        SELECT
            c.company_id, c.company_name, c.company_email, c.company_phone,
            c.company_website, c.company_description,
            c.company_rating AS stored_rating,
            (SELECT AVG(cr.rating)::float8 FROM company_ratings cr
             WHERE cr.company_id = c.company_id) AS avg_rating,
            a.premise_name, a.street_name, a.barangay_name, a.city_name,
            (SELECT COUNT(*) FROM job j
             WHERE j.company_id = c.company_id AND j.job_is_active = TRUE) AS active_jobs_count,
            (SELECT COUNT(*) FROM job j WHERE j.company_id = c.company_id) AS total_jobs_count,
            (SELECT COUNT(*) FROM company_ratings cr
             WHERE cr.company_id = c.company_id) AS total_ratings,
            ($1::int IS NOT NULL AND EXISTS (
                SELECT 1 FROM followed_companies fc
                WHERE fc.company_id = c.company_id AND fc.job_seeker_id = $1)) AS is_followed
        FROM company c
        LEFT JOIN address a ON c.address_id = a.address_id
        WHERE ($2::int IS NULL OR c.company_id = $2)
        ORDER BY c.company_name, c.company_id
        "#,
    )
    .bind(job_seeker_id)
    .bind(only)
    .fetch_all(pool)
    .await
}

pub(crate) async fn ensure_company_exists(pool: &PgPool, company_id: i32) -> Result<(), AppError> {
    let found: Option<i32> = sqlx::query_scalar("SELECT company_id FROM company WHERE company_id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
}

/// Buckets category links by job id, keeping the incoming order per job.
pub fn group_categories(links: Vec<JobCategoryLink>) -> HashMap<i32, Vec<JobCategoryRow>> {
    let mut grouped: HashMap<i32, Vec<JobCategoryRow>> = HashMap::new();
    for link in links {
        grouped.entry(link.job_id).or_default().push(JobCategoryRow {
            job_category_id: link.job_category_id,
            job_category_name: link.job_category_name,
        });
    }
    grouped
}
