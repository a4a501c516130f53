// src/models/notification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Events that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationKind {
    TenderBid,
    BidApproved,
    BidRejected,
}

/// Represents the 'notifications' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Id of the bid the notification is about.
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A notification about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_id: Option<i64>,
}
