// src/models/tender.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::{moderation::ModerationStatus, validate_string_list},
    utils::json_list::StringList,
};

/// Work status of a tender, independent of moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TenderStatus {
    Open,
    InProgress,
    Completed,
    Canceled,
}

/// Represents the 'tenders' table, joined with owner info and bid count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tender {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub budget: Option<i64>,
    pub location: String,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub status: TenderStatus,

    /// Stored as a JSON array in a TEXT column.
    pub images: StringList,

    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub moderation_comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    // Joined from users.
    pub owner_username: String,
    pub owner_rating: i64,

    pub bids_count: i64,
}

/// SELECT list + FROM clause shared by all tender reads.
pub const TENDER_SELECT: &str = r#"
    SELECT
        t.id, t.user_id, t.title, t.description, t.category, t.subcategory, t.budget,
        t.location, t.deadline, t.status, t.images, t.moderation_status, t.moderated_by,
        t.moderated_at, t.moderation_comment, t.created_at, t.updated_at,
        u.username AS owner_username, u.rating AS owner_rating,
        (SELECT COUNT(*) FROM tender_bids b WHERE b.tender_id = t.id) AS bids_count
    FROM tenders t
    JOIN users u ON u.id = t.user_id
"#;

/// DTO for creating a new tender.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenderRequest {
    #[validate(length(min = 3, max = 200, message = "Title length must be between 3 and 200 chars"))]
    pub title: String,
    #[validate(length(min = 10, max = 10000, message = "Description length must be between 10 and 10000 chars"))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[validate(range(min = 0))]
    pub budget: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    #[validate(custom(function = validate_string_list))]
    pub images: Vec<String>,
}

/// DTO for updating a tender. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTenderRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[validate(range(min = 0))]
    pub budget: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub status: Option<TenderStatus>,
    #[validate(custom(function = validate_string_list))]
    pub images: Option<Vec<String>>,
}

impl UpdateTenderRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.budget.is_none()
            && self.location.is_none()
            && self.deadline.is_none()
            && self.status.is_none()
            && self.images.is_none()
    }
}

/// Sort orders accepted by the tender list.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenderSort {
    #[default]
    Newest,
    Oldest,
    BudgetAsc,
    BudgetDesc,
    Deadline,
}

impl TenderSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            TenderSort::Newest => " ORDER BY t.created_at DESC, t.id DESC",
            TenderSort::Oldest => " ORDER BY t.created_at ASC, t.id ASC",
            TenderSort::BudgetAsc => " ORDER BY t.budget IS NULL, t.budget ASC, t.id DESC",
            TenderSort::BudgetDesc => " ORDER BY t.budget IS NULL, t.budget DESC, t.id DESC",
            TenderSort::Deadline => " ORDER BY t.deadline IS NULL, t.deadline ASC, t.id DESC",
        }
    }
}

/// Query parameters for listing tenders.
#[derive(Debug, Default, Deserialize)]
pub struct TenderListParams {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub location: Option<String>,
    pub status: Option<TenderStatus>,
    /// Keyword matched against title and description.
    pub search: Option<String>,
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub sort: TenderSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Admins only: include pending and rejected tenders.
    #[serde(default, alias = "showAll")]
    pub show_all: bool,
}
