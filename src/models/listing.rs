// src/models/listing.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::{moderation::ModerationStatus, validate_string_list},
    utils::json_list::StringList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ListingType {
    Sell,
    Rent,
    Buy,
}

/// Represents the 'marketplace_listings' table, joined with seller info.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MarketplaceListing {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub price: i64,
    pub listing_type: ListingType,
    pub location: String,
    pub images: StringList,
    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub moderation_comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    pub seller_username: String,
    pub seller_rating: i64,
}

pub const LISTING_SELECT: &str = r#"
    SELECT
        l.id, l.user_id, l.title, l.description, l.category, l.subcategory, l.price,
        l.listing_type, l.location, l.images, l.moderation_status, l.moderated_by,
        l.moderated_at, l.moderation_comment, l.created_at, l.updated_at,
        u.username AS seller_username, u.rating AS seller_rating
    FROM marketplace_listings l
    JOIN users u ON u.id = l.user_id
"#;

/// DTO for creating a listing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    pub listing_type: ListingType,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[serde(default)]
    #[validate(custom(function = validate_string_list))]
    pub images: Vec<String>,
}

/// DTO for updating a listing. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    pub listing_type: Option<ListingType>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[validate(custom(function = validate_string_list))]
    pub images: Option<Vec<String>>,
}

impl UpdateListingRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.price.is_none()
            && self.listing_type.is_none()
            && self.location.is_none()
            && self.images.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl ListingSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            ListingSort::Newest => " ORDER BY l.created_at DESC, l.id DESC",
            ListingSort::Oldest => " ORDER BY l.created_at ASC, l.id ASC",
            ListingSort::PriceAsc => " ORDER BY l.price ASC, l.id DESC",
            ListingSort::PriceDesc => " ORDER BY l.price DESC, l.id DESC",
        }
    }
}

/// Query parameters for listing marketplace ads.
#[derive(Debug, Default, Deserialize)]
pub struct ListingListParams {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub listing_type: Option<ListingType>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub sort: ListingSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default, alias = "showAll")]
    pub show_all: bool,
}
