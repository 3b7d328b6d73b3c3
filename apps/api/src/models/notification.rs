use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub notification_id: i32,
    pub account_id: i32,
    pub notification_message: String,
    pub notification_is_read: bool,
    pub notification_created_at: DateTime<Utc>,
}
