//! Job seeker ratings of companies. One rating per (company, seeker); rating
//! again replaces the previous one.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::extractors::JobSeekerUser;
use crate::companies::handlers::ensure_company_exists;
use crate::errors::AppError;
use crate::state::AppState;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateRequest {
    pub rating: Option<i32>,
    #[serde(alias = "review_text")]
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub message: String,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
pub struct MyRatingResponse {
    #[serde(rename = "hasRated")]
    pub has_rated: bool,
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

pub fn validate_rating(rating: Option<i32>) -> Result<i32, AppError> {
    match rating {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(r),
        _ => Err(AppError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        ))),
    }
}

/// POST /api/companies/:id/rate
pub async fn handle_rate(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
    seeker: JobSeekerUser,
    Json(req): Json<RateRequest>,
) -> Result<Json<RateResponse>, AppError> {
    let rating = validate_rating(req.rating)?;
    ensure_company_exists(&state.db, company_id).await?;
    let review = req.review_text.filter(|r| !r.trim().is_empty());

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO company_ratings (company_id, job_seeker_id, rating, review_text)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (company_id, job_seeker_id)
        DO UPDATE SET rating = EXCLUDED.rating,
                      review_text = EXCLUDED.review_text,
                      rated_at = NOW()
        "#,
    )
    .bind(company_id)
    .bind(seeker.job_seeker_id)
    .bind(rating)
    .bind(review)
    .execute(&mut *tx)
    .await?;

    let average: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(rating)::float8 FROM company_ratings WHERE company_id = $1",
    )
    .bind(company_id)
    .fetch_one(&mut *tx)
    .await?;
    let average = average.unwrap_or(0.0);

    sqlx::query("UPDATE company SET company_rating = $1 WHERE company_id = $2")
        .bind(average)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "Job seeker {} rated company {company_id} {rating}/{MAX_RATING}",
        seeker.job_seeker_id
    );
    Ok(Json(RateResponse {
        message: "Rating submitted successfully".to_string(),
        average_rating: average,
    }))
}

/// GET /api/companies/:id/rating
pub async fn handle_my_rating(
    State(state): State<AppState>,
    Path(company_id): Path<i32>,
    seeker: JobSeekerUser,
) -> Result<Json<MyRatingResponse>, AppError> {
    let row: Option<(i32, Option<String>)> = sqlx::query_as(
        "SELECT rating, review_text FROM company_ratings WHERE company_id = $1 AND job_seeker_id = $2",
    )
    .bind(company_id)
    .bind(seeker.job_seeker_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(match row {
        Some((rating, review_text)) => MyRatingResponse {
            has_rated: true,
            rating: Some(rating),
            review_text,
        },
        None => MyRatingResponse {
            has_rated: false,
            rating: None,
            review_text: None,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert_eq!(validate_rating(Some(1)).unwrap(), 1);
        assert_eq!(validate_rating(Some(5)).unwrap(), 5);
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
        assert!(validate_rating(None).is_err());
    }

    #[test]
    fn test_rate_request_accepts_both_review_spellings() {
        let camel: RateRequest =
            serde_json::from_str(r#"{"rating":4,"reviewText":"Great team"}"#).unwrap();
        let snake: RateRequest =
            serde_json::from_str(r#"{"rating":4,"review_text":"Great team"}"#).unwrap();
        assert_eq!(camel.review_text.as_deref(), Some("Great team"));
        assert_eq!(snake.review_text.as_deref(), Some("Great team"));
    }

    #[test]
    fn test_my_rating_shape() {
        let json = serde_json::to_value(MyRatingResponse {
            has_rated: true,
            rating: Some(3),
            review_text: None,
        })
        .unwrap();
        assert_eq!(json["hasRated"], true);
        assert_eq!(json["rating"], 3);
        assert!(json["review_text"].is_null());
    }
}
