// src/models/bid.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{models::validate_documents, utils::json_list::StringList};

/// Lifecycle of a bid. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BidStatus::Pending)
    }
}

/// Represents the 'tender_bids' table, joined with bidder info.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenderBid {
    pub id: i64,
    pub tender_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub description: String,
    /// Days needed to complete the work.
    pub timeframe: i64,
    pub documents: StringList,
    pub status: BidStatus,
    pub rejection_reason: Option<String>,
    /// Legacy flag kept in sync with `status == approved`.
    pub is_accepted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,

    // Joined from users and tenders.
    pub bidder_username: String,
    pub bidder_rating: i64,
    pub tender_title: String,
}

pub const BID_SELECT: &str = r#"
    SELECT
        b.id, b.tender_id, b.user_id, b.amount, b.description, b.timeframe, b.documents,
        b.status, b.rejection_reason, b.is_accepted, b.created_at,
        u.username AS bidder_username, u.rating AS bidder_rating,
        t.title AS tender_title
    FROM tender_bids b
    JOIN users u ON u.id = b.user_id
    JOIN tenders t ON t.id = b.tender_id
"#;

/// DTO for submitting a bid.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBidRequest {
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 5000, message = "Description must be between 1 and 5000 chars"))]
    pub description: String,
    #[validate(range(min = 1, max = 3650, message = "Timeframe must be between 1 and 3650 days"))]
    pub timeframe: i64,
    /// Missing is treated as empty so it fails validation with 400.
    #[serde(default)]
    #[validate(custom(function = validate_documents))]
    pub documents: Vec<String>,
}

/// DTO for rejecting a bid.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectBidRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(documents: Vec<&str>) -> CreateBidRequest {
        CreateBidRequest {
            amount: 1000,
            description: "Can start next week".to_string(),
            timeframe: 14,
            documents: documents.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_documents_required() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec!["  "]).validate().is_err());
        assert!(request(vec!["/api/files/1-a.pdf"]).validate().is_ok());
    }

    #[test]
    fn test_missing_documents_field_deserializes_empty() {
        let req: CreateBidRequest = serde_json::from_value(serde_json::json!({
            "amount": 5, "description": "x", "timeframe": 3
        }))
        .unwrap();
        assert!(req.documents.is_empty());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BidStatus::Pending.is_terminal());
        assert!(BidStatus::Approved.is_terminal());
        assert!(BidStatus::Rejected.is_terminal());
    }
}
