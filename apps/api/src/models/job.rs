use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub job_id: i32,
    pub company_id: i32,
    pub job_type_id: i32,
    pub job_type_name: String,
    pub job_name: String,
    pub job_description: String,
    pub job_location: Option<String>,
    pub job_salary: Option<String>,
    pub job_time: Option<String>,
    pub job_rating: Option<f64>,
    pub job_is_active: bool,
    pub job_posted_date: DateTime<Utc>,
    pub job_closing_date: Option<DateTime<Utc>>,
}

/// Job listing row enriched with its company name, used by search and saved jobs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListingRow {
    pub job_id: i32,
    pub company_id: i32,
    pub company_name: String,
    pub company_rating: Option<f64>,
    pub job_type_name: String,
    pub job_name: String,
    pub job_description: String,
    pub job_location: Option<String>,
    pub job_salary: Option<String>,
    pub job_time: Option<String>,
    pub job_is_active: bool,
    pub job_posted_date: DateTime<Utc>,
    pub job_closing_date: Option<DateTime<Utc>>,
}

/// A company's own posting with its application count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobRow,
    pub application_count: i64,
}

/// A job on a company page, annotated for the viewing job seeker.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyJobRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobRow,
    pub has_applied: bool,
    pub is_saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobCategoryRow {
    pub job_category_id: i32,
    pub job_category_name: String,
}

/// Category link for one job, used to attach categories to job lists.
#[derive(Debug, Clone, FromRow)]
pub struct JobCategoryLink {
    pub job_id: i32,
    pub job_category_id: i32,
    pub job_category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanySummary {
    pub company_id: i32,
    pub company_name: String,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_rating: Option<f64>,
}
