// src/services/notify.rs

use sqlx::SqliteConnection;

use crate::models::notification::{NewNotification, NotificationKind};

/// Notification for the tender owner when a bid arrives.
pub fn bid_submitted(owner_id: i64, tender_title: &str, bid_id: i64, amount: i64) -> NewNotification {
    NewNotification {
        user_id: owner_id,
        title: "New bid on your tender".to_string(),
        message: format!("A new bid of {} was submitted on \"{}\".", amount, tender_title),
        kind: NotificationKind::TenderBid,
        related_id: Some(bid_id),
    }
}

/// Notification for the bidder when the owner approves the bid.
pub fn bid_approved(bidder_id: i64, tender_title: &str, bid_id: i64) -> NewNotification {
    NewNotification {
        user_id: bidder_id,
        title: "Your bid was approved".to_string(),
        message: format!("Your bid on \"{}\" was approved by the tender owner.", tender_title),
        kind: NotificationKind::BidApproved,
        related_id: Some(bid_id),
    }
}

/// Notification for the bidder when the owner rejects the bid.
/// The reason is appended when present and non-blank.
pub fn bid_rejected(
    bidder_id: i64,
    tender_title: &str,
    bid_id: i64,
    reason: Option<&str>,
) -> NewNotification {
    let mut message = format!("Your bid on \"{}\" was rejected.", tender_title);
    if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
        message.push_str(" Reason: ");
        message.push_str(reason);
    }

    NewNotification {
        user_id: bidder_id,
        title: "Your bid was rejected".to_string(),
        message,
        kind: NotificationKind::BidRejected,
        related_id: Some(bid_id),
    }
}

/// Writes a notification on the given connection (usually an open transaction).
pub async fn insert(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
) -> Result<i64, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO notifications (user_id, title, message, type, related_id)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.kind)
    .bind(notification.related_id)
    .fetch_one(conn)
    .await?;

    tracing::debug!(
        "Notification {} ({:?}) queued for user {}",
        id,
        notification.kind,
        notification.user_id
    );

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_embeds_reason() {
        let n = bid_rejected(7, "Roof repair", 3, Some("Price too high"));
        assert_eq!(n.kind, NotificationKind::BidRejected);
        assert_eq!(n.user_id, 7);
        assert!(n.message.contains("Price too high"));
    }

    #[test]
    fn test_rejection_without_reason() {
        let n = bid_rejected(7, "Roof repair", 3, Some("   "));
        assert!(!n.message.contains("Reason"));
        let n = bid_rejected(7, "Roof repair", 3, None);
        assert!(!n.message.contains("Reason"));
    }

    #[test]
    fn test_submitted_targets_owner() {
        let n = bid_submitted(1, "Foundation", 9, 25000);
        assert_eq!(n.user_id, 1);
        assert_eq!(n.kind, NotificationKind::TenderBid);
        assert_eq!(n.related_id, Some(9));
        assert!(n.message.contains("25000"));
    }
}
