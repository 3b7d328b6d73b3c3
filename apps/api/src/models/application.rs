use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Only accept/reject are valid employer responses.
    pub fn parse_response(raw: &str) -> Option<Self> {
        match raw {
            "accepted" => Some(RequestStatus::Accepted),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// An application as seen by the job seeker who submitted it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeekerApplicationRow {
    pub request_id: i32,
    pub request_date: DateTime<Utc>,
    pub request_status: String,
    pub cover_letter: Option<String>,
    pub employee_response: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub job_id: i32,
    pub job_name: String,
    pub job_location: Option<String>,
    pub job_salary: Option<String>,
    pub company_name: String,
    pub job_type_name: String,
}

/// An application as seen by an employee of the hiring company.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyApplicationRow {
    pub request_id: i32,
    pub request_date: DateTime<Utc>,
    pub request_status: String,
    pub cover_letter: Option<String>,
    pub employee_response: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub job_id: i32,
    pub job_name: String,
    pub applicant_name: String,
    pub applicant_email: String,
}
