// src/models/crew.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::{moderation::ModerationStatus, validate_string_list},
    utils::json_list::StringList,
};

/// Represents the 'crews' directory table (teams offering services).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Crew {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub specializations: StringList,
    pub members_count: i64,
    pub description: String,
    pub location: String,
    pub hourly_rate: Option<i64>,
    pub images: StringList,
    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub moderation_comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner_username: String,
    pub owner_rating: i64,
}

pub const CREW_SELECT: &str = r#"
    SELECT
        c.id, c.user_id, c.name, c.specializations, c.members_count, c.description,
        c.location, c.hourly_rate, c.images, c.moderation_status, c.moderated_by,
        c.moderated_at, c.moderation_comment, c.created_at,
        u.username AS owner_username, u.rating AS owner_rating
    FROM crews c
    JOIN users u ON u.id = c.user_id
"#;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCrewRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one specialization is required"), custom(function = validate_string_list))]
    pub specializations: Vec<String>,
    #[validate(range(min = 1, max = 500))]
    pub members_count: i64,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(range(min = 0))]
    pub hourly_rate: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = validate_string_list))]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCrewRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1), custom(function = validate_string_list))]
    pub specializations: Option<Vec<String>>,
    #[validate(range(min = 1, max = 500))]
    pub members_count: Option<i64>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub hourly_rate: Option<i64>,
    #[validate(custom(function = validate_string_list))]
    pub images: Option<Vec<String>>,
}

impl UpdateCrewRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.specializations.is_none()
            && self.members_count.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.hourly_rate.is_none()
            && self.images.is_none()
    }
}
