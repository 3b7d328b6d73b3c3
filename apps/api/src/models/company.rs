use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::job::{CompanyJobRow, JobCategoryRow};

/// A company with its address and job/rating aggregates, as read from the
/// database. `is_followed` is false for guests and non-seekers.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRecord {
    pub company_id: i32,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub stored_rating: Option<f64>,
    pub avg_rating: Option<f64>,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub active_jobs_count: i64,
    pub total_jobs_count: i64,
    pub total_ratings: i64,
    pub is_followed: bool,
}

/// Company as listed on `/api/companies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyListItem {
    pub company_id: i32,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub company_rating: f64,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub active_jobs_count: i64,
    pub total_jobs_count: i64,
    pub total_ratings: i64,
    pub is_followed: bool,
}

impl From<CompanyRecord> for CompanyListItem {
    fn from(r: CompanyRecord) -> Self {
        CompanyListItem {
            company_rating: effective_rating(r.avg_rating, r.stored_rating),
            company_id: r.company_id,
            company_name: r.company_name,
            company_email: r.company_email,
            company_phone: r.company_phone,
            company_website: r.company_website,
            company_description: r.company_description,
            premise_name: r.premise_name,
            street_name: r.street_name,
            barangay_name: r.barangay_name,
            city_name: r.city_name,
            active_jobs_count: r.active_jobs_count,
            total_jobs_count: r.total_jobs_count,
            total_ratings: r.total_ratings,
            is_followed: r.is_followed,
        }
    }
}

/// A company job with its categories, for the company page.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyJobView {
    #[serde(flatten)]
    pub job: CompanyJobRow,
    pub categories: Vec<JobCategoryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    pub company_id: i32,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub company_rating: f64,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub total_ratings: i64,
    pub is_following: bool,
    pub jobs: Vec<CompanyJobView>,
}

impl CompanyDetail {
    pub fn new(r: CompanyRecord, jobs: Vec<CompanyJobView>) -> Self {
        CompanyDetail {
            company_rating: effective_rating(r.avg_rating, r.stored_rating),
            company_id: r.company_id,
            company_name: r.company_name,
            company_email: r.company_email,
            company_phone: r.company_phone,
            company_website: r.company_website,
            company_description: r.company_description,
            premise_name: r.premise_name,
            street_name: r.street_name,
            barangay_name: r.barangay_name,
            city_name: r.city_name,
            total_ratings: r.total_ratings,
            is_following: r.is_followed,
            jobs,
        }
    }
}

/// Falls back from the live average to the stored rating, then zero.
pub fn effective_rating(avg_rating: Option<f64>, stored_rating: Option<f64>) -> f64 {
    match (avg_rating, stored_rating) {
        (Some(avg), _) if avg > 0.0 => avg,
        (_, Some(stored)) => stored,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(avg: Option<f64>, stored: Option<f64>) -> CompanyRecord {
        CompanyRecord {
            company_id: 3,
            company_name: "Acme".into(),
            company_email: "hr@acme.test".into(),
            company_phone: None,
            company_website: None,
            company_description: None,
            stored_rating: stored,
            avg_rating: avg,
            premise_name: None,
            street_name: None,
            barangay_name: None,
            city_name: Some("Cebu".into()),
            active_jobs_count: 2,
            total_jobs_count: 5,
            total_ratings: 4,
            is_followed: true,
        }
    }

    #[test]
    fn test_average_preferred_over_stored() {
        assert_eq!(effective_rating(Some(4.5), Some(3.0)), 4.5);
    }

    #[test]
    fn test_stored_used_without_ratings() {
        assert_eq!(effective_rating(Some(0.0), Some(3.0)), 3.0);
        assert_eq!(effective_rating(None, Some(2.5)), 2.5);
    }

    #[test]
    fn test_defaults_to_zero() {
        assert_eq!(effective_rating(None, None), 0.0);
    }

    #[test]
    fn test_list_item_uses_effective_rating() {
        let item = CompanyListItem::from(record(None, Some(3.5)));
        assert_eq!(item.company_rating, 3.5);
        assert!(item.is_followed);
        assert_eq!(item.total_jobs_count, 5);
    }

    #[test]
    fn test_detail_serializes_is_following() {
        let detail = CompanyDetail::new(record(Some(4.0), None), Vec::new());
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["is_following"], true);
        assert_eq!(json["company_rating"], 4.0);
        assert!(json["jobs"].as_array().unwrap().is_empty());
    }
}
