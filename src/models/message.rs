// src/models/message.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'messages' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One row per counterpart in the inbox view.
#[derive(Debug, Serialize, FromRow)]
pub struct ConversationSummary {
    pub user_id: i64,
    pub username: String,
    pub avatar: Option<String>,
    pub last_message: String,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
    pub unread_count: i64,
}

/// DTO for sending a message.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub content: String,
}
