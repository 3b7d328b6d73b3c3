use axum::{extract::State, Json};

use crate::auth::extractors::JobSeekerUser;
use crate::errors::AppError;
use crate::models::application::SeekerApplicationRow;
use crate::state::AppState;

/// GET /api/jobseeker/applications
pub async fn handle_applications(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
) -> Result<Json<Vec<SeekerApplicationRow>>, AppError> {
    let applications = sqlx::query_as::<_, SeekerApplicationRow>(
        r#"
        SELECT
            jr.request_id, jr.request_date, jr.request_status, jr.cover_letter,
            jr.employee_response, jr.response_date,
            j.job_id, j.job_name, j.job_location, j.job_salary,
            c.company_name, jt.job_type_name
        FROM job_requests jr
        JOIN job j ON jr.job_id = j.job_id
        JOIN company c ON j.company_id = c.company_id
        JOIN job_type jt ON j.job_type_id = jt.job_type_id
        WHERE jr.job_seeker_id = $1
        ORDER BY jr.request_date DESC, jr.request_id DESC
        "#,
    )
    .bind(seeker.job_seeker_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}
