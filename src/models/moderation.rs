// src/models/moderation.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Admin gatekeeping flag controlling public visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }
}

/// The four kinds of user-generated content that go through moderation.
/// Used as the `{kind}` path segment of the admin moderation routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeratedKind {
    Tenders,
    Marketplace,
    Specialists,
    Crews,
}

impl ModeratedKind {
    pub const ALL: [ModeratedKind; 4] = [
        ModeratedKind::Tenders,
        ModeratedKind::Marketplace,
        ModeratedKind::Specialists,
        ModeratedKind::Crews,
    ];

    /// Backing table. Never derived from user input, only from the enum.
    pub fn table(&self) -> &'static str {
        match self {
            ModeratedKind::Tenders => "tenders",
            ModeratedKind::Marketplace => "marketplace_listings",
            ModeratedKind::Specialists => "specialists",
            ModeratedKind::Crews => "crews",
        }
    }

    /// Path segment, as used in the admin routes.
    pub fn slug(&self) -> &'static str {
        match self {
            ModeratedKind::Tenders => "tenders",
            ModeratedKind::Marketplace => "marketplace",
            ModeratedKind::Specialists => "specialists",
            ModeratedKind::Crews => "crews",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModeratedKind::Tenders => "Tender",
            ModeratedKind::Marketplace => "Listing",
            ModeratedKind::Specialists => "Specialist",
            ModeratedKind::Crews => "Crew",
        }
    }
}

/// Body for admin approve/reject actions.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ModerationDecision {
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Result of a moderation action.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ModerationOutcome {
    pub id: i64,
    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub moderation_comment: Option<String>,
}
