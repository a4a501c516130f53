// src/handlers/message.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::message::{ConversationSummary, Message, SendMessageRequest},
    utils::{html::clean_html, jwt::CurrentUser, validated::ValidatedJson},
};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_read, created_at";

/// Sends a private message.
pub async fn send_message(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.receiver_id == user.id {
        return Err(AppError::BadRequest(
            "You cannot send a message to yourself".to_string(),
        ));
    }

    let receiver_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(payload.receiver_id)
        .fetch_optional(&pool)
        .await?;
    if receiver_exists.is_none() {
        return Err(AppError::NotFound("Receiver not found".to_string()));
    }

    let content = clean_html(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let message = sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (sender_id, receiver_id, content) VALUES (?, ?, ?) RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(user.id)
    .bind(payload.receiver_id)
    .bind(content)
    .fetch_one(&pool)
    .await?;

    tracing::debug!("User {} sent message {} to {}", user.id, message.id, payload.receiver_id);

    Ok((StatusCode::CREATED, Json(message)))
}

/// Inbox: one entry per counterpart with the latest message, most recent first.
pub async fn list_conversations(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let conversations = sqlx::query_as::<_, ConversationSummary>(
        r#"
        WITH latest AS (
            SELECT
                CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS other_id,
                MAX(id) AS last_id
            FROM messages
            WHERE sender_id = ?1 OR receiver_id = ?1
            GROUP BY other_id
        )
        SELECT
            u.id AS user_id, u.username, u.avatar,
            m.content AS last_message, m.created_at AS last_message_at,
            (SELECT COUNT(*) FROM messages x
             WHERE x.sender_id = u.id AND x.receiver_id = ?1 AND x.is_read = 0) AS unread_count
        FROM latest
        JOIN messages m ON m.id = latest.last_id
        JOIN users u ON u.id = latest.other_id
        ORDER BY m.created_at DESC, m.id DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(conversations))
}

/// Full conversation with one user, oldest first.
pub async fn get_conversation(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(other_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let messages = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS} FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(user.id)
    .bind(other_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(messages))
}

/// Marks everything `other_id` sent to the caller as read. Safe to repeat.
pub async fn mark_conversation_read(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(other_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(other_id)
    .bind(user.id)
    .execute(&pool)
    .await?;

    Ok(Json(json!({ "updated": result.rows_affected() })))
}
