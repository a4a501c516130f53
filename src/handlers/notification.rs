// src/handlers/notification.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{error::AppError, models::notification::Notification, utils::jwt::CurrentUser};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, type, related_id, is_read, created_at";

pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(notifications))
}

pub async fn unread_count(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
            .bind(user.id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({ "count": count })))
}

/// Marks one of the caller's notifications as read. Someone else's id is a 404.
pub async fn mark_read(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let notification = sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .bind(user.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user.id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "updated": result.rows_affected() })))
}
