// src/models/specialist.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::{moderation::ModerationStatus, validate_string_list},
    utils::json_list::StringList,
};

/// Represents the 'specialists' directory table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Specialist {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub specializations: StringList,
    pub experience_years: i64,
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

pub const SPECIALIST_SELECT: &str = r#"
    SELECT
        s.id, s.user_id, s.name, s.specializations, s.experience_years, s.description,
        s.location, s.hourly_rate, s.images, s.moderation_status, s.moderated_by,
        s.moderated_at, s.moderation_comment, s.created_at,
        u.username AS owner_username, u.rating AS owner_rating
    FROM specialists s
    JOIN users u ON u.id = s.user_id
"#;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSpecialistRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one specialization is required"), custom(function = validate_string_list))]
    pub specializations: Vec<String>,
    #[validate(range(min = 0, max = 80))]
    #[serde(default)]
    pub experience_years: i64,
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
pub struct UpdateSpecialistRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1), custom(function = validate_string_list))]
    pub specializations: Option<Vec<String>>,
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i64>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub hourly_rate: Option<i64>,
    #[validate(custom(function = validate_string_list))]
    pub images: Option<Vec<String>>,
}

impl UpdateSpecialistRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.specializations.is_none()
            && self.experience_years.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.hourly_rate.is_none()
            && self.images.is_none()
    }
}

/// Query parameters shared by the specialist and crew directories.
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryListParams {
    pub search: Option<String>,
    pub location: Option<String>,
    /// Matches one entry of the specializations array.
    pub specialization: Option<String>,
    pub user_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default, alias = "showAll")]
    pub show_all: bool,
}
