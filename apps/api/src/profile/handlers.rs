//! Axum route handlers for profile editing, job preferences and nationalities.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::auth::extractors::{AuthUser, JobSeekerUser};
use crate::auth::handlers::MessageResponse;
use crate::auth::registration::{
    find_or_create_nationality, insert_address, AddressInput, DEFAULT_NATIONALITY,
};
use crate::errors::AppError;
use crate::models::account::NationalityRow;
use crate::models::job::JobCategoryRow;
use crate::models::non_blank;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesRequest {
    pub category_ids: Vec<i32>,
}

/// A validated profile edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub nationality: String,
    pub address: AddressInput,
}

impl ProfileUpdateRequest {
    pub fn validate(self) -> Result<ProfileUpdate, AppError> {
        let first_name = non_blank(self.first_name);
        let last_name = non_blank(self.last_name);
        let (Some(first_name), Some(last_name)) = (first_name, last_name) else {
            return Err(AppError::Validation(
                "First name and last name are required".to_string(),
            ));
        };
        Ok(ProfileUpdate {
            first_name,
            last_name,
            middle_name: non_blank(self.middle_name),
            phone: non_blank(self.phone),
            nationality: non_blank(self.nationality)
                .unwrap_or_else(|| DEFAULT_NATIONALITY.to_string()),
            address: AddressInput::from_parts(
                self.premise_name,
                self.street_name,
                self.barangay_name,
                self.city_name,
            ),
        })
    }
}

/// Deduplicates while keeping the caller's order; empty selections are rejected.
pub fn normalize_category_ids(ids: Vec<i32>) -> Result<Vec<i32>, AppError> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    if unique.is_empty() {
        return Err(AppError::Validation(
            "At least one category must be selected".to_string(),
        ));
    }
    Ok(unique)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/profile/update
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let update = req.validate()?;

    let mut tx = state.db.begin().await?;
    let person: Option<(i32, Option<i32>)> = sqlx::query_as(
        r#"
        SELECT p.person_id, p.address_id
        FROM account a
        LEFT JOIN job_seeker js ON a.account_id = js.account_id
        LEFT JOIN employee e ON a.account_id = e.account_id
        JOIN person p ON p.person_id = COALESCE(js.person_id, e.person_id)
        WHERE a.account_id = $1
        "#,
    )
    .bind(user.account_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (person_id, address_id) =
        person.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let nationality_id = find_or_create_nationality(&mut tx, &update.nationality).await?;

    let address_id = match address_id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE address
                SET premise_name = $1, street_name = $2, barangay_name = $3, city_name = $4
                WHERE address_id = $5
                "#,
            )
            .bind(&update.address.premise_name)
            .bind(&update.address.street_name)
            .bind(&update.address.barangay_name)
            .bind(&update.address.city_name)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            id
        }
        None => insert_address(&mut tx, &update.address).await?,
    };

    sqlx::query(
        r#"
        UPDATE person
        SET first_name = $1, last_name = $2, middle_name = $3,
            nationality_id = $4, address_id = $5
        WHERE person_id = $6
        "#,
    )
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.middle_name)
    .bind(nationality_id)
    .bind(address_id)
    .bind(person_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE account SET account_phone = $1 WHERE account_id = $2")
        .bind(&update.phone)
        .bind(user.account_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Profile updated for account {}", user.account_id);
    Ok(Json(MessageResponse {
        message: "Profile updated successfully".to_string(),
    }))
}

/// GET /api/job-preferences
pub async fn handle_get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<JobCategoryRow>>, AppError> {
    let categories = sqlx::query_as::<_, JobCategoryRow>(
        r#"
        SELECT jc.job_category_id, jc.job_category_name
        FROM jobseeker_preference jp
        JOIN job_category jc ON jp.preferred_job_category_id = jc.job_category_id
        JOIN job_seeker js ON jp.person_id = js.person_id
        WHERE js.account_id = $1
        ORDER BY jc.job_category_name
        "#,
    )
    .bind(user.account_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(categories))
}

/// POST /api/job-preferences
pub async fn handle_save_preferences(
    State(state): State<AppState>,
    seeker: JobSeekerUser,
    Json(req): Json<PreferencesRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let category_ids = normalize_category_ids(req.category_ids)?;

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM jobseeker_preference WHERE person_id = $1")
        .bind(seeker.person_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO jobseeker_preference (person_id, preferred_job_category_id)
        SELECT $1, UNNEST($2::int[])
        "#,
    )
    .bind(seeker.person_id)
    .bind(category_ids.as_slice())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "Saved {} job preferences for job seeker {}",
        category_ids.len(),
        seeker.job_seeker_id
    );
    Ok(Json(MessageResponse {
        message: "Preferences saved successfully".to_string(),
    }))
}

/// GET /api/nationalities
pub async fn handle_nationalities(
    State(state): State<AppState>,
) -> Result<Json<Vec<NationalityRow>>, AppError> {
    let rows = sqlx::query_as::<_, NationalityRow>(
        "SELECT nationality_id, nationality_name FROM nationality ORDER BY nationality_name ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first: &str, last: &str) -> ProfileUpdateRequest {
        ProfileUpdateRequest {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_names_required() {
        assert!(matches!(
            request("", "Santos").validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            request("Ana", "   ").validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_defaults_applied() {
        let update = request(" Ana ", "Santos").validate().unwrap();
        assert_eq!(update.first_name, "Ana");
        assert_eq!(update.nationality, DEFAULT_NATIONALITY);
        assert_eq!(update.address.city_name, "N/A");
        assert_eq!(update.phone, None);
    }

    #[test]
    fn test_category_ids_deduplicated() {
        assert_eq!(normalize_category_ids(vec![3, 1, 3, 2]).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_preferences_rejected() {
        assert!(matches!(
            normalize_category_ids(Vec::new()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_preferences_request_shape() {
        let req: PreferencesRequest =
            serde_json::from_str(r#"{"categoryIds":[1,4]}"#).unwrap();
        assert_eq!(req.category_ids, vec![1, 4]);
    }
}
