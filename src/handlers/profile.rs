use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{NotificationPreferencesRequest, User},
    repository::PgStore,
    utils::jwt::Claims,
};

/// Current user's account and reminder settings.
pub async fn get_me(
    State(store): State<PgStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, email_notifications_enabled, reminder_time, time_zone, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(store.pool())
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Update reminder preferences. `reminderTime` is a UTC "HH:MM".
pub async fn update_notifications(
    State(store): State<PgStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NotificationPreferencesRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let updated = store
        .update_notification_preferences(
            user_id,
            payload.enabled,
            &payload.reminder_time,
            &payload.time_zone,
        )
        .await?;
    if !updated {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id, enabled = payload.enabled, "Notification preferences updated");
    Ok(Json(serde_json::json!({
        "enabled": payload.enabled,
        "reminderTime": payload.reminder_time,
        "timeZone": payload.time_zone,
    })))
}
