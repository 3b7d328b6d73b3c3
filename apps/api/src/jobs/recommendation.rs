//! Job recommendation: pluggable ranking of open jobs for one job seeker.
//!
//! Default: `PreferenceRecommender`. A job whose categories intersect the
//! seeker's preferred categories scores `PREFERENCE_MATCH_SCORE`, every other
//! job scores 0. Ties break on company rating (missing = 0), then on the most
//! recent posting date.
//!
//! `fetch_candidates` bounds the window in SQL with the same ordering;
//! `AppState` holds an `Arc<dyn JobRecommender>` that ranks within it.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

pub const PREFERENCE_MATCH_SCORE: i32 = 10;

/// An open job with the category ids it is listed under.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateJob {
    pub job_id: i32,
    pub job_name: String,
    pub job_description: String,
    pub job_location: Option<String>,
    pub job_salary: Option<String>,
    pub job_time: Option<String>,
    pub job_rating: Option<f64>,
    pub job_posted_date: DateTime<Utc>,
    pub company_id: i32,
    pub company_name: String,
    pub company_rating: Option<f64>,
    pub job_type_name: String,
    #[serde(skip_serializing)]
    pub category_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedJob {
    #[serde(flatten)]
    pub job: CandidateJob,
    pub preference_score: i32,
}

pub trait JobRecommender: Send + Sync {
    fn rank(
        &self,
        candidates: Vec<CandidateJob>,
        preferred_categories: &HashSet<i32>,
        limit: usize,
    ) -> Vec<RecommendedJob>;
}

pub struct PreferenceRecommender;

impl PreferenceRecommender {
    pub fn score(job: &CandidateJob, preferred_categories: &HashSet<i32>) -> i32 {
        if job
            .category_ids
            .iter()
            .any(|id| preferred_categories.contains(id))
        {
            PREFERENCE_MATCH_SCORE
        } else {
            0
        }
    }
}

impl JobRecommender for PreferenceRecommender {
    fn rank(
        &self,
        candidates: Vec<CandidateJob>,
        preferred_categories: &HashSet<i32>,
        limit: usize,
    ) -> Vec<RecommendedJob> {
        let mut ranked: Vec<RecommendedJob> = candidates
            .into_iter()
            .map(|job| RecommendedJob {
                preference_score: Self::score(&job, preferred_categories),
                job,
            })
            .collect();

        ranked.sort_by(compare_recommendations);
        ranked.truncate(limit);
        ranked
    }
}

fn compare_recommendations(a: &RecommendedJob, b: &RecommendedJob) -> Ordering {
    b.preference_score
        .cmp(&a.preference_score)
        .then_with(|| {
            let ra = a.job.company_rating.unwrap_or(0.0);
            let rb = b.job.company_rating.unwrap_or(0.0);
            rb.total_cmp(&ra)
        })
        .then_with(|| b.job.job_posted_date.cmp(&a.job.job_posted_date))
        .then_with(|| b.job.job_id.cmp(&a.job.job_id))
}

/// The top `limit` open jobs, one row per job, ordered in SQL by the same
/// keys `PreferenceRecommender` uses: preference match, company rating
/// (missing = 0), posting date, then job id.
pub async fn fetch_candidates(
    pool: &PgPool,
    preferred_categories: &HashSet<i32>,
    limit: i64,
) -> Result<Vec<CandidateJob>, sqlx::Error> {
    let preferred: Vec<i32> = preferred_categories.iter().copied().collect();
    sqlx::query_as::<_, CandidateJob>(
        r#"
        SELECT
            j.job_id, j.job_name, j.job_description, j.job_location,
            j.job_salary, j.job_time, j.job_rating, j.job_posted_date,
            c.company_id, c.company_name, c.company_rating,
            jt.job_type_name,
            COALESCE(
                (SELECT array_agg(jcl.job_category_id ORDER BY jcl.job_category_id)
                 FROM job_category_list jcl WHERE jcl.job_id = j.job_id),
                '{}'::int[]
            ) AS category_ids
        FROM job j
        JOIN company c ON j.company_id = c.company_id
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE j.job_is_active = TRUE
          AND (j.job_closing_date IS NULL OR j.job_closing_date > NOW())
        ORDER BY
            EXISTS (
                SELECT 1 FROM job_category_list pref
                WHERE pref.job_id = j.job_id AND pref.job_category_id = ANY($1)
            ) DESC,
            COALESCE(c.company_rating, 0) DESC,
            j.job_posted_date DESC,
            j.job_id DESC
        LIMIT $2
        "#,
    )
    .bind(preferred)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Preferred category ids of the job seeker behind an account. Empty for
/// accounts that are not job seekers.
pub async fn fetch_preferred_categories(
    pool: &PgPool,
    account_id: i32,
) -> Result<HashSet<i32>, sqlx::Error> {
    let ids: Vec<i32> = sqlx::query_scalar(
        r#"
        SELECT jp.preferred_job_category_id
        FROM jobseeker_preference jp
        JOIN job_seeker js ON js.person_id = jp.person_id
        WHERE js.account_id = $1
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
