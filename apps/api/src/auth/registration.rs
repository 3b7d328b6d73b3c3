//! Registration: request validation, then a single transaction per branch.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::auth::password::{hash_password_blocking, MIN_PASSWORD_LEN};
use crate::auth::verification::{generate_code, upsert_code};
use crate::errors::AppError;
use crate::models::account::{ACCOUNT_TYPE_COMPANY, ACCOUNT_TYPE_JOB_SEEKER};
use crate::models::{deserialize_optional_id, non_blank};

pub const DEFAULT_NATIONALITY: &str = "Filipino";
const ADDRESS_PLACEHOLDER: &str = "N/A";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub user_type: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub company_id: Option<i32>,
    pub company_name: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub premise_name: Option<String>,
    pub street_name: Option<String>,
    pub barangay_name: Option<String>,
    pub city_name: Option<String>,
    pub company_premise_name: Option<String>,
    pub company_street_name: Option<String>,
    pub company_barangay_name: Option<String>,
    pub company_city_name: Option<String>,
    pub nationality_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    JobSeeker,
    Employee,
    Company,
}

impl UserType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "job-seeker" => Some(UserType::JobSeeker),
            "employee" => Some(UserType::Employee),
            "company" => Some(UserType::Company),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::JobSeeker => "job-seeker",
            UserType::Employee => "employee",
            UserType::Company => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressInput {
    pub premise_name: String,
    pub street_name: String,
    pub barangay_name: String,
    pub city_name: String,
}

impl AddressInput {
    pub fn from_parts(
        premise: Option<String>,
        street: Option<String>,
        barangay: Option<String>,
        city: Option<String>,
    ) -> Self {
        Self {
            premise_name: or_placeholder(premise),
            street_name: or_placeholder(street),
            barangay_name: or_placeholder(barangay),
            city_name: or_placeholder(city),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRegistration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: AddressInput,
}

/// Role-specific row created alongside the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    JobSeeker,
    Employee { company_id: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRegistration {
    pub role: AccountRole,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub password: String,
    pub nationality: String,
    pub address: AddressInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Company(CompanyRegistration),
    Account(AccountRegistration),
}

/// Checks every field rule that needs no database access.
pub fn validate(req: RegisterRequest) -> Result<Registration, AppError> {
    let user_type = req
        .user_type
        .as_deref()
        .and_then(UserType::parse)
        .ok_or_else(|| {
            AppError::Validation(
                "Please select a valid user type (job-seeker, employee, or company)".to_string(),
            )
        })?;

    if user_type == UserType::Company {
        let (Some(name), Some(email)) = (non_blank(req.company_name), non_blank(req.company_email))
        else {
            return Err(AppError::Validation(
                "Company name and email are required for company registration".to_string(),
            ));
        };
        return Ok(Registration::Company(CompanyRegistration {
            name,
            email,
            phone: non_blank(req.company_phone),
            website: non_blank(req.company_website),
            description: non_blank(req.company_description),
            address: AddressInput::from_parts(
                req.company_premise_name,
                req.company_street_name,
                req.company_barangay_name,
                req.company_city_name,
            ),
        }));
    }

    let (Some(first_name), Some(last_name), Some(email), Some(username), Some(password)) = (
        non_blank(req.first_name),
        non_blank(req.last_name),
        non_blank(req.email),
        non_blank(req.username),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "All required fields must be filled".to_string(),
        ));
    };

    if req.confirm_password.as_deref() != Some(password.as_str()) {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let role = match user_type {
        UserType::Employee => AccountRole::Employee {
            company_id: req.company_id.ok_or_else(|| {
                AppError::Validation("Company ID is required for employees".to_string())
            })?,
        },
        _ => AccountRole::JobSeeker,
    };

    Ok(Registration::Account(AccountRegistration {
        role,
        first_name,
        last_name,
        middle_name: non_blank(req.middle_name),
        email,
        username,
        phone: non_blank(req.phone),
        password,
        nationality: non_blank(req.nationality_name)
            .unwrap_or_else(|| DEFAULT_NATIONALITY.to_string()),
        address: AddressInput::from_parts(
            req.premise_name,
            req.street_name,
            req.barangay_name,
            req.city_name,
        ),
    }))
}

/// Creates a company with its address. Companies have no login account.
pub async fn register_company(pool: &PgPool, reg: &CompanyRegistration) -> Result<i32, AppError> {
    let mut tx = pool.begin().await?;

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT company_id FROM company WHERE company_email = $1")
            .bind(&reg.email)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Company with this email already exists".to_string(),
        ));
    }

    let address_id = insert_address(&mut tx, &reg.address).await?;
    let company_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO company
            (company_name, company_email, company_phone, company_website, company_description, address_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING company_id
        "#,
    )
    .bind(&reg.name)
    .bind(&reg.email)
    .bind(&reg.phone)
    .bind(&reg.website)
    .bind(&reg.description)
    .bind(address_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Created company {company_id}");
    Ok(company_id)
}

pub struct CreatedAccount {
    pub account_id: i32,
    pub verification_code: String,
}

/// Creates address, person, account, role row and verification code atomically.
pub async fn register_account(
    pool: &PgPool,
    reg: &AccountRegistration,
    code_ttl_minutes: i64,
) -> Result<CreatedAccount, AppError> {
    if let AccountRole::Employee { company_id } = reg.role {
        let company: Option<i32> =
            sqlx::query_scalar("SELECT company_id FROM company WHERE company_id = $1")
                .bind(company_id)
                .fetch_optional(pool)
                .await?;
        if company.is_none() {
            return Err(AppError::Validation(
                "Invalid company ID. Company does not exist.".to_string(),
            ));
        }
    }

    let password_hash = hash_password_blocking(reg.password.clone()).await?;
    let mut tx = pool.begin().await?;

    let existing: Option<i32> = sqlx::query_scalar(
        "SELECT account_id FROM account WHERE account_email = $1 OR account_username = $2",
    )
    .bind(&reg.email)
    .bind(&reg.username)
    .fetch_optional(&mut *tx)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email or username already exists".to_string(),
        ));
    }

    let nationality_id = find_or_create_nationality(&mut tx, &reg.nationality).await?;
    let address_id = insert_address(&mut tx, &reg.address).await?;

    let person_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO person (first_name, last_name, middle_name, address_id, nationality_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING person_id
        "#,
    )
    .bind(&reg.first_name)
    .bind(&reg.last_name)
    .bind(&reg.middle_name)
    .bind(address_id)
    .bind(nationality_id)
    .fetch_one(&mut *tx)
    .await?;

    let account_type_id = match reg.role {
        AccountRole::JobSeeker => ACCOUNT_TYPE_JOB_SEEKER,
        AccountRole::Employee { .. } => ACCOUNT_TYPE_COMPANY,
    };
    let account_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO account
            (account_email, account_username, account_phone, account_number,
             account_password, account_type_id, account_is_verified)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        RETURNING account_id
        "#,
    )
    .bind(&reg.email)
    .bind(&reg.username)
    .bind(&reg.phone)
    .bind(generate_account_number())
    .bind(&password_hash)
    .bind(account_type_id)
    .fetch_one(&mut *tx)
    .await?;

    match reg.role {
        AccountRole::JobSeeker => {
            sqlx::query("INSERT INTO job_seeker (person_id, account_id) VALUES ($1, $2)")
                .bind(person_id)
                .bind(account_id)
                .execute(&mut *tx)
                .await?;
        }
        AccountRole::Employee { company_id } => {
            sqlx::query(
                "INSERT INTO employee (person_id, account_id, company_id, position_name) VALUES ($1, $2, $3, 'Employee')",
            )
            .bind(person_id)
            .bind(account_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    let verification_code = generate_code();
    upsert_code(&mut *tx, account_id, &verification_code, code_ttl_minutes).await?;

    tx.commit().await?;
    info!("Created account {account_id} ({:?})", reg.role);

    Ok(CreatedAccount {
        account_id,
        verification_code,
    })
}

pub async fn find_or_create_nationality(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<i32, sqlx::Error> {
    // Upsert keeps concurrent registrations with a new nationality from colliding.
    sqlx::query_scalar(
        r#"
        INSERT INTO nationality (nationality_name) VALUES ($1)
        ON CONFLICT (nationality_name) DO UPDATE SET nationality_name = EXCLUDED.nationality_name
        RETURNING nationality_id
        "#,
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn insert_address(
    tx: &mut Transaction<'_, Postgres>,
    address: &AddressInput,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO address (premise_name, street_name, barangay_name, city_name)
        VALUES ($1, $2, $3, $4)
        RETURNING address_id
        "#,
    )
    .bind(&address.premise_name)
    .bind(&address.street_name)
    .bind(&address.barangay_name)
    .bind(&address.city_name)
    .fetch_one(&mut **tx)
    .await
}

fn generate_account_number() -> String {
    format!("ACC{}", Utc::now().timestamp_millis())
}

fn or_placeholder(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| ADDRESS_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::test_support::{app, job_seeker_registration, post_json, send, PASSWORD};

    fn job_seeker_request() -> RegisterRequest {
        RegisterRequest {
            user_type: Some("job-seeker".into()),
            first_name: Some("Ana".into()),
            last_name: Some("Reyes".into()),
            email: Some("ana@example.com".into()),
            username: Some("ana".into()),
            password: Some("supersecret".into()),
            confirm_password: Some("supersecret".into()),
            ..Default::default()
        }
    }

    fn validation_message(req: RegisterRequest) -> String {
        match validate(req) {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_job_seeker() {
        let Registration::Account(reg) = validate(job_seeker_request()).unwrap() else {
            panic!("expected account registration");
        };
        assert_eq!(reg.role, AccountRole::JobSeeker);
        assert_eq!(reg.nationality, DEFAULT_NATIONALITY);
        assert_eq!(reg.address.city_name, "N/A");
    }

    #[test]
    fn test_invalid_user_type() {
        let mut req = job_seeker_request();
        req.user_type = Some("admin".into());
        assert!(validation_message(req).contains("valid user type"));

        let mut req = job_seeker_request();
        req.user_type = None;
        assert!(validation_message(req).contains("valid user type"));
    }

    #[test]
    fn test_missing_required_field() {
        let mut req = job_seeker_request();
        req.username = Some("   ".into());
        assert_eq!(validation_message(req), "All required fields must be filled");
    }

    #[test]
    fn test_password_mismatch() {
        let mut req = job_seeker_request();
        req.confirm_password = Some("different1".into());
        assert_eq!(validation_message(req), "Passwords do not match");
    }

    #[test]
    fn test_short_password() {
        let mut req = job_seeker_request();
        req.password = Some("short".into());
        req.confirm_password = Some("short".into());
        assert!(validation_message(req).contains("at least 8"));
    }

    #[test]
    fn test_employee_requires_company_id() {
        let mut req = job_seeker_request();
        req.user_type = Some("employee".into());
        assert_eq!(
            validation_message(req),
            "Company ID is required for employees"
        );

        let mut req = job_seeker_request();
        req.user_type = Some("employee".into());
        req.company_id = Some(3);
        let Registration::Account(reg) = validate(req).unwrap() else {
            panic!("expected account registration");
        };
        assert_eq!(reg.role, AccountRole::Employee { company_id: 3 });
    }

    #[test]
    fn test_company_registration() {
        let req = RegisterRequest {
            user_type: Some("company".into()),
            company_name: Some("Acme".into()),
            company_email: Some("hr@acme.test".into()),
            company_city_name: Some("Cebu".into()),
            ..Default::default()
        };
        let Registration::Company(reg) = validate(req).unwrap() else {
            panic!("expected company registration");
        };
        assert_eq!(reg.name, "Acme");
        assert_eq!(reg.address.city_name, "Cebu");
        assert_eq!(reg.address.premise_name, "N/A");
    }

    #[test]
    fn test_company_requires_name_and_email() {
        let req = RegisterRequest {
            user_type: Some("company".into()),
            company_name: Some("Acme".into()),
            ..Default::default()
        };
        assert!(validation_message(req).contains("Company name and email"));
    }

    #[test]
    fn test_request_accepts_string_company_id() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"userType":"employee","companyId":"15"}"#).unwrap();
        assert_eq!(req.company_id, Some(15));
    }

    #[test]
    fn test_account_number_format() {
        let n = generate_account_number();
        assert!(n.starts_with("ACC"));
        assert!(n[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_or_username_conflicts(pool: PgPool) {
        let first = job_seeker_registration("ana@example.com", "ana");
        register_account(&pool, &first, 10).await.unwrap();

        for (email, username) in [("ana@example.com", "ana2"), ("other@example.com", "ana")] {
            let reg = job_seeker_registration(email, username);
            match register_account(&pool, &reg, 10).await {
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("{email}/{username}: expected conflict, got {other:?}"),
                Ok(_) => panic!("{email}/{username}: duplicate account created"),
            }
        }

        let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(accounts, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_register_returns_409(pool: PgPool) {
        let body = serde_json::json!({
            "userType": "job-seeker",
            "firstName": "Ana", "lastName": "Reyes",
            "email": "ana@example.com", "username": "ana",
            "password": PASSWORD, "confirmPassword": PASSWORD
        });
        let (status, created) =
            send(app(pool.clone()), post_json("/api/auth/register", None, body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["emailSent"], true);

        let (status, body) = send(app(pool), post_json("/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_registration_stores_argon2_hash_and_code(pool: PgPool) {
        let reg = job_seeker_registration("ana@example.com", "ana");
        let created = register_account(&pool, &reg, 10).await.unwrap();

        let (hash, verified): (String, bool) = sqlx::query_as(
            "SELECT account_password, account_is_verified FROM account WHERE account_id = $1",
        )
        .bind(created.account_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!verified);

        let code: String =
            sqlx::query_scalar("SELECT code FROM verification_codes WHERE account_id = $1")
                .bind(created.account_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(code, created.verification_code);
    }
}
