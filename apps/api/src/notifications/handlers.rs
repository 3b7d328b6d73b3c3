use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::extractors::AuthUser;
use crate::auth::handlers::MessageResponse;
use crate::errors::AppError;
use crate::models::notification::NotificationRow;
use crate::state::AppState;

/// GET /api/notifications
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT notification_id, account_id, notification_message,
               notification_is_read, notification_created_at
        FROM notifications
        WHERE account_id = $1
        ORDER BY notification_created_at DESC, notification_id DESC
        "#,
    )
    .bind(user.account_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// POST /api/notifications/:id/read
/// Someone else's notification is reported as missing.
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<i32>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE notifications SET notification_is_read = TRUE
        WHERE notification_id = $1 AND account_id = $2
        "#,
    )
    .bind(notification_id)
    .bind(user.account_id)
    .execute(&state.db)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}
