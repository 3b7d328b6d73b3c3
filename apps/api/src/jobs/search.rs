use serde::Deserialize;
use sqlx::PgPool;

use crate::models::job::JobListingRow;
use crate::models::{deserialize_optional_count, deserialize_optional_id};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Blank parameters (`?q=&category=&limit=`) read as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub category: Option<i32>,
    pub location: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_count")]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LimitQuery {
    #[serde(deserialize_with = "deserialize_optional_count")]
    pub limit: Option<i64>,
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Case-insensitive substring pattern for ILIKE, with LIKE wildcards in the
/// user's input escaped. Blank input means "no filter".
pub fn like_pattern(raw: Option<&str>) -> Option<String> {
    let term = raw.map(str::trim).filter(|t| !t.is_empty())?;
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// Open jobs matching the filters, newest first.
pub async fn search_jobs(pool: &PgPool, query: &SearchQuery) -> Result<Vec<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(
        r#"
        SELECT
            j.job_id, j.company_id, c.company_name, c.company_rating, jt.job_type_name,
            j.job_name, j.job_description, j.job_location, j.job_salary, j.job_time,
            j.job_is_active, j.job_posted_date, j.job_closing_date
        FROM job j
        JOIN company c ON j.company_id = c.company_id
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE j.job_is_active = TRUE
          AND (j.job_closing_date IS NULL OR j.job_closing_date > NOW())
          AND ($1::text IS NULL OR j.job_name ILIKE $1 OR j.job_description ILIKE $1)
          AND ($2::int IS NULL OR EXISTS (
                SELECT 1 FROM job_category_list jcl
                WHERE jcl.job_id = j.job_id AND jcl.job_category_id = $2))
          AND ($3::text IS NULL OR j.job_location ILIKE $3)
        ORDER BY j.job_posted_date DESC, j.job_id DESC
        LIMIT $4
        "#,
    )
    .bind(like_pattern(query.q.as_deref()))
    .bind(query.category)
    .bind(like_pattern(query.location.as_deref()))
    .bind(clamp_limit(query.limit))
    .fetch_all(pool)
    .await
}
