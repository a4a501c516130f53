// src/models/review.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'reviews' table, joined with the reviewer's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub tender_id: Option<i64>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub reviewer_username: String,
}

pub const REVIEW_SELECT: &str = r#"
    SELECT
        r.id, r.reviewer_id, r.reviewee_id, r.tender_id, r.rating, r.comment, r.created_at,
        u.username AS reviewer_username
    FROM reviews r
    JOIN users u ON u.id = r.reviewer_id
"#;

/// DTO for leaving a review.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub reviewee_id: i64,
    pub tender_id: Option<i64>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Response for review creation: the review plus the reviewee's new aggregate.
#[derive(Debug, Serialize)]
pub struct CreateReviewResponse {
    pub review: Review,
    pub reviewee_rating: i64,
}
