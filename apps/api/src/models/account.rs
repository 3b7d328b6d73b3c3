use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ACCOUNT_TYPE_COMPANY: i32 = 1;
pub const ACCOUNT_TYPE_JOB_SEEKER: i32 = 2;

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub account_id: i32,
    pub account_email: String,
    pub account_username: String,
    pub account_password: String,
    pub account_is_verified: bool,
    pub account_created_at: DateTime<Utc>,
}

/// Public view of an account returned alongside freshly issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub is_verified: bool,
}

impl From<&AccountRow> for AccountSummary {
    fn from(row: &AccountRow) -> Self {
        Self {
            id: row.account_id,
            email: row.account_email.clone(),
            username: row.account_username.clone(),
            is_verified: row.account_is_verified,
        }
    }
}

/// One row of the `/api/auth/me` join across person, role and company tables.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub account_id: i32,
    pub account_username: String,
    pub account_email: String,
    pub account_phone: Option<String>,
    pub account_is_verified: bool,
    pub account_type_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub nationality_name: Option<String>,
    pub company_id: Option<i32>,
    pub company_name: Option<String>,
    pub position_name: Option<String>,
    pub employee_id: Option<i32>,
    pub job_seeker_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NationalityRow {
    #[sqlx(rename = "nationality_id")]
    pub id: i32,
    #[sqlx(rename = "nationality_name")]
    pub name: String,
}
