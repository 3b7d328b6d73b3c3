use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: u64,
    pub verification_code_ttl_minutes: i64,
    pub smtp: Option<SmtpConfig>,
    pub port: u16,
    pub rust_log: String,
}

/// Outgoing mail settings. Absent when `SMTP_HOST` is unset, in which case
/// verification codes are only written to the log.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", 24 * 7)?,
            verification_code_ttl_minutes: parse_env("VERIFICATION_CODE_TTL_MINUTES", 10)?,
            smtp: SmtpConfig::from_env()?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(SmtpConfig {
            host,
            port: parse_env("SMTP_PORT", 587)?,
            user: std::env::var("SMTP_USER").unwrap_or_default(),
            pass: std::env::var("SMTP_PASS").unwrap_or_default(),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "GO JOB <noreply@gojob.com>".to_string()),
        }))
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid value, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by router tests; never touches the environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/jobboard_test".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 1,
            verification_code_ttl_minutes: 10,
            smtp: None,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
