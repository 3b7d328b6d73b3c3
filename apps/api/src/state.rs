use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::JwtKeys;
use crate::config::Config;
use crate::email::Mailer;
use crate::jobs::recommendation::JobRecommender;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub jwt: JwtKeys,
    /// SMTP in production, log-only when `SMTP_HOST` is unset.
    pub mailer: Arc<dyn Mailer>,
    /// Pluggable job ranking. Default: PreferenceRecommender.
    pub recommender: Arc<dyn JobRecommender>,
}
