//! Axum route handlers for the employer dashboard: postings, applications
//! and hiring stats for the employee's own company.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use crate::auth::extractors::EmployeeUser;
use crate::errors::AppError;
use crate::models::application::{CompanyApplicationRow, RequestStatus};
use crate::models::{deserialize_optional_id, non_blank};
use crate::models::job::PostingRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RespondRequest {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub application_id: Option<i32>,
    pub status: Option<String>,
    pub response: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub message: String,
    pub status: RequestStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    pub job_name: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub job_type_id: Option<i32>,
    pub job_description: Option<String>,
    pub job_location: Option<String>,
    pub job_salary: Option<String>,
    pub job_time: Option<String>,
    pub job_closing_date: Option<DateTime<Utc>>,
    pub category_ids: Vec<i32>,
}

/// A validated new posting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub name: String,
    pub job_type_id: i32,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub time: Option<String>,
    pub closing_date: Option<DateTime<Utc>>,
    pub category_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub message: String,
    pub job_id: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToggleJobRequest {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub job_id: Option<i32>,
    /// Absent means flip the current state.
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleJobResponse {
    pub message: String,
    pub job_id: i32,
    pub is_active: bool,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub active_jobs: i64,
    pub pending_applications: i64,
    pub filled_positions: i64,
    pub total_jobs: i64,
}

impl CreateJobRequest {
    pub fn validate(self) -> Result<NewJob, AppError> {
        let name = non_blank(self.job_name);
        let description = non_blank(self.job_description);
        let (Some(name), Some(job_type_id), Some(description)) =
            (name, self.job_type_id, description)
        else {
            return Err(AppError::Validation(
                "Job name, job type and description are required".to_string(),
            ));
        };
        let mut category_ids = self.category_ids;
        category_ids.sort_unstable();
        category_ids.dedup();
        Ok(NewJob {
            name,
            job_type_id,
            description,
            location: non_blank(self.job_location),
            salary: non_blank(self.job_salary),
            time: non_blank(self.job_time),
            closing_date: self.job_closing_date,
            category_ids,
        })
    }
}

/// Notification text sent to an applicant when their application is answered.
pub fn application_notification(job_name: &str, status: RequestStatus) -> String {
    format!(
        "Your application for \"{job_name}\" has been {}.",
        status.as_str()
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/employee/job-history
pub async fn handle_job_history(
    State(state): State<AppState>,
    employee: EmployeeUser,
) -> Result<Json<Vec<PostingRow>>, AppError> {
    let postings = sqlx::query_as::<_, PostingRow>(
        r#"
        SELECT
            j.job_id, j.company_id, j.job_type_id, jt.job_type_name, j.job_name,
            j.job_description, j.job_location, j.job_salary, j.job_time, j.job_rating,
            j.job_is_active, j.job_posted_date, j.job_closing_date,
            (SELECT COUNT(*) FROM job_requests jr WHERE jr.job_id = j.job_id) AS application_count
        FROM job j
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE j.company_id = $1
        ORDER BY j.job_posted_date DESC, j.job_id DESC
        "#,
    )
    .bind(employee.company_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(postings))
}

/// GET /api/employee/applications
pub async fn handle_applications(
    State(state): State<AppState>,
    employee: EmployeeUser,
) -> Result<Json<Vec<CompanyApplicationRow>>, AppError> {
    let applications = sqlx::query_as::<_, CompanyApplicationRow>(
        r#"
        SELECT
            jr.request_id, jr.request_date, jr.request_status, jr.cover_letter,
            jr.employee_response, jr.response_date,
            j.job_id, j.job_name,
            CONCAT_WS(' ', p.first_name, p.middle_name, p.last_name) AS applicant_name,
            a.account_email AS applicant_email
        FROM job_requests jr
        JOIN job j ON jr.job_id = j.job_id
        JOIN job_seeker js ON jr.job_seeker_id = js.job_seeker_id
        JOIN person p ON js.person_id = p.person_id
        JOIN account a ON js.account_id = a.account_id
        WHERE j.company_id = $1
        ORDER BY jr.request_date DESC, jr.request_id DESC
        "#,
    )
    .bind(employee.company_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// POST /api/employee/applications/respond
pub async fn handle_respond(
    State(state): State<AppState>,
    employee: EmployeeUser,
    Json(req): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    let status = req.status.as_deref().and_then(RequestStatus::parse_response);
    let (Some(application_id), Some(status)) = (req.application_id, status) else {
        return Err(AppError::Validation(
            "Valid application ID and status are required".to_string(),
        ));
    };

    let mut tx = state.db.begin().await?;
    let target: Option<(i32, i32, String)> = sqlx::query_as(
        r#"
        SELECT j.company_id, js.account_id, j.job_name
        FROM job_requests jr
        JOIN job j ON jr.job_id = j.job_id
        JOIN job_seeker js ON jr.job_seeker_id = js.job_seeker_id
        WHERE jr.request_id = $1
        FOR UPDATE OF jr
        "#,
    )
    .bind(application_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (company_id, applicant_account_id, job_name) =
        target.ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    if company_id != employee.company_id {
        return Err(AppError::Forbidden(
            "Unauthorized to respond to this request".to_string(),
        ));
    }

    let response = non_blank(req.response);
    sqlx::query(
        r#"
        UPDATE job_requests
        SET request_status = $1, employee_response = $2, response_date = NOW()
        WHERE request_id = $3
        "#,
    )
    .bind(status.as_str())
    .bind(&response)
    .bind(application_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO notifications (account_id, notification_message) VALUES ($1, $2)")
        .bind(applicant_account_id)
        .bind(application_notification(&job_name, status))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "Employee {} marked application {application_id} {}",
        employee.employee_id,
        status.as_str()
    );
    Ok(Json(RespondResponse {
        message: format!("Job request {} successfully", status.as_str()),
        status,
    }))
}

/// POST /api/employee/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    employee: EmployeeUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let job = req.validate()?;

    let mut tx = state.db.begin().await?;
    let job_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO job (
            company_id, job_type_id, job_name, job_description, job_location,
            job_salary, job_time, job_is_active, job_posted_date, job_closing_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NOW(), $8)
        RETURNING job_id
        "#,
    )
    .bind(employee.company_id)
    .bind(job.job_type_id)
    .bind(&job.name)
    .bind(&job.description)
    .bind(&job.location)
    .bind(&job.salary)
    .bind(&job.time)
    .bind(job.closing_date)
    .fetch_one(&mut *tx)
    .await?;

    if !job.category_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO job_category_list (job_id, job_category_id)
            SELECT $1, UNNEST($2::int[])
            "#,
        )
        .bind(job_id)
        .bind(job.category_ids.as_slice())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(
        "Employee {} posted job {job_id} for company {}",
        employee.employee_id, employee.company_id
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            message: "Job posted successfully".to_string(),
            job_id,
        }),
    ))
}

/// POST /api/employee/toggle-job-status
pub async fn handle_toggle_job_status(
    State(state): State<AppState>,
    employee: EmployeeUser,
    Json(req): Json<ToggleJobRequest>,
) -> Result<Json<ToggleJobResponse>, AppError> {
    let job_id = req
        .job_id
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;

    let current: Option<(i32, bool)> =
        sqlx::query_as("SELECT company_id, job_is_active FROM job WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(&state.db)
            .await?;
    let (company_id, was_active) =
        current.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    if company_id != employee.company_id {
        return Err(AppError::Forbidden(
            "You can only manage your company's jobs".to_string(),
        ));
    }

    let is_active = req.is_active.unwrap_or(!was_active);
    sqlx::query("UPDATE job SET job_is_active = $1 WHERE job_id = $2")
        .bind(is_active)
        .bind(job_id)
        .execute(&state.db)
        .await?;

    Ok(Json(ToggleJobResponse {
        message: if is_active {
            "Job activated successfully".to_string()
        } else {
            "Job deactivated successfully".to_string()
        },
        job_id,
        is_active,
    }))
}

/// GET /api/employee/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    employee: EmployeeUser,
) -> Result<Json<EmployeeStats>, AppError> {
    let stats = sqlx::query_as::<_, EmployeeStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM job
             WHERE company_id = $1 AND job_is_active = TRUE) AS active_jobs,
            (SELECT COUNT(*) FROM job_requests jr JOIN job j ON jr.job_id = j.job_id
             WHERE j.company_id = $1 AND jr.request_status = $2) AS pending_applications,
            (SELECT COUNT(*) FROM job_requests jr JOIN job j ON jr.job_id = j.job_id
             WHERE j.company_id = $1 AND jr.request_status = $3
               AND date_trunc('month', jr.response_date) = date_trunc('month', NOW())
            ) AS filled_positions,
            (SELECT COUNT(*) FROM job WHERE company_id = $1) AS total_jobs
        "#,
    )
    .bind(employee.company_id)
    .bind(RequestStatus::Pending.as_str())
    .bind(RequestStatus::Accepted.as_str())
    .fetch_one(&state.db)
    .await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateJobRequest {
        CreateJobRequest {
            job_name: Some("Backend Engineer".into()),
            job_type_id: Some(1),
            job_description: Some("Build services".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_job_requires_core_fields() {
        let mut req = create_request();
        req.job_type_id = None;
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let mut req = create_request();
        req.job_description = Some("  ".into());
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_job_dedups_categories() {
        let mut req = create_request();
        req.category_ids = vec![4, 2, 4];
        req.job_location = Some("".into());
        let job = req.validate().unwrap();
        assert_eq!(job.category_ids, vec![2, 4]);
        assert_eq!(job.location, None);
    }

    #[test]
    fn test_create_job_request_from_form_json() {
        let req: CreateJobRequest = serde_json::from_str(
            r#"{"jobName":"QA","jobTypeId":"2","jobDescription":"Test things","categoryIds":[1]}"#,
        )
        .unwrap();
        let job = req.validate().unwrap();
        assert_eq!(job.job_type_id, 2);
        assert_eq!(job.category_ids, vec![1]);
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(
            application_notification("QA Tester", RequestStatus::Accepted),
            "Your application for \"QA Tester\" has been accepted."
        );
    }

    #[test]
    fn test_respond_status_serializes_lowercase() {
        let json = serde_json::to_value(RespondResponse {
            message: "ok".into(),
            status: RequestStatus::Rejected,
        })
        .unwrap();
        assert_eq!(json["status"], "rejected");
    }

    #[test]
    fn test_stats_camel_case() {
        let json = serde_json::to_value(EmployeeStats {
            active_jobs: 2,
            pending_applications: 3,
            filled_positions: 1,
            total_jobs: 5,
        })
        .unwrap();
        assert_eq!(json["pendingApplications"], 3);
        assert_eq!(json["filledPositions"], 1);
    }
}
