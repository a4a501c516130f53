// src/services/bids.rs

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    db,
    error::AppError,
    models::{
        bid::{BID_SELECT, BidStatus, CreateBidRequest, TenderBid},
        user::User,
    },
    services::notify,
    utils::{html::clean_html, json_list::StringList},
};

/// What the tender owner decided about a bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidDecision {
    Approve,
    Reject { reason: Option<String> },
}

impl BidDecision {
    fn target(&self) -> BidStatus {
        match self {
            BidDecision::Approve => BidStatus::Approved,
            BidDecision::Reject { .. } => BidStatus::Rejected,
        }
    }
}

/// Only pending bids can be decided. Approved and rejected are final.
pub fn plan_transition(current: BidStatus, decision: &BidDecision) -> Result<BidStatus, AppError> {
    if current.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Bid is already {}",
            match current {
                BidStatus::Approved => "approved",
                _ => "rejected",
            }
        )));
    }
    Ok(decision.target())
}

#[derive(sqlx::FromRow)]
struct TenderOwner {
    user_id: i64,
    title: String,
}

#[derive(sqlx::FromRow)]
struct BidContext {
    bid_user_id: i64,
    status: BidStatus,
    tender_id: i64,
    tender_owner_id: i64,
    tender_title: String,
}

async fn fetch_bid(conn: &mut SqliteConnection, bid_id: i64) -> Result<TenderBid, AppError> {
    sqlx::query_as::<_, TenderBid>(&format!("{BID_SELECT} WHERE b.id = ?"))
        .bind(bid_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("Bid not found".to_string()))
}

/// Submits a bid on a tender and notifies the tender owner, atomically.
///
/// Errors: 404 if the tender does not exist, 403 if the bidder owns the tender.
/// The request body has already been validated (documents non-empty).
pub async fn submit_bid(
    pool: &SqlitePool,
    bidder_id: i64,
    tender_id: i64,
    req: CreateBidRequest,
) -> Result<TenderBid, AppError> {
    let mut tx = db::begin_write(pool).await?;

    let tender = sqlx::query_as::<_, TenderOwner>("SELECT user_id, title FROM tenders WHERE id = ?")
        .bind(tender_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Tender not found".to_string()))?;

    if tender.user_id == bidder_id {
        return Err(AppError::Forbidden(
            "You cannot bid on your own tender".to_string(),
        ));
    }

    let documents = StringList::new(
        req.documents
            .into_iter()
            .map(|d| d.trim().to_string())
            .collect(),
    );

    let bid_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tender_bids (tender_id, user_id, amount, description, timeframe, documents)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(tender_id)
    .bind(bidder_id)
    .bind(req.amount)
    .bind(clean_html(&req.description))
    .bind(req.timeframe)
    .bind(documents)
    .fetch_one(&mut *tx)
    .await?;

    let notification = notify::bid_submitted(tender.user_id, &tender.title, bid_id, req.amount);
    notify::insert(&mut *tx, &notification).await?;

    let bid = fetch_bid(&mut *tx, bid_id).await?;
    tx.commit().await?;

    tracing::info!(
        "User {} placed bid {} on tender {} ({})",
        bidder_id,
        bid_id,
        tender_id,
        req.amount
    );

    Ok(bid)
}

/// Approves or rejects a bid on behalf of the tender owner and notifies the bidder,
/// atomically. Fails with 404 (no bid), 403 (not the owner) or 409 (already decided,
/// or the tender already has an approved bid).
pub async fn decide_bid(
    pool: &SqlitePool,
    owner_id: i64,
    bid_id: i64,
    decision: BidDecision,
) -> Result<TenderBid, AppError> {
    let mut tx = db::begin_write(pool).await?;

    let ctx = sqlx::query_as::<_, BidContext>(
        r#"
        SELECT b.user_id AS bid_user_id, b.status, b.tender_id,
               t.user_id AS tender_owner_id, t.title AS tender_title
        FROM tender_bids b
        JOIN tenders t ON t.id = b.tender_id
        WHERE b.id = ?
        "#,
    )
    .bind(bid_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Bid not found".to_string()))?;

    if ctx.tender_owner_id != owner_id {
        return Err(AppError::Forbidden(
            "Only the tender owner can decide on bids".to_string(),
        ));
    }

    let next = plan_transition(ctx.status, &decision)?;

    if next == BidStatus::Approved {
        let approved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tender_bids WHERE tender_id = ? AND status = 'approved'",
        )
        .bind(ctx.tender_id)
        .fetch_one(&mut *tx)
        .await?;

        if approved > 0 {
            return Err(AppError::Conflict(
                "This tender already has an approved bid".to_string(),
            ));
        }
    }

    let reason = match &decision {
        BidDecision::Reject { reason } => reason
            .as_deref()
            .map(clean_html)
            .filter(|r| !r.is_empty()),
        BidDecision::Approve => None,
    };

    // Guards against a decision committed since the status was read.
    let updated = sqlx::query(
        r#"
        UPDATE tender_bids
        SET status = ?, rejection_reason = ?, is_accepted = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(next)
    .bind(&reason)
    .bind(next == BidStatus::Approved)
    .bind(bid_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Conflict("Bid is no longer pending".to_string()));
    }

    let notification = match next {
        BidStatus::Approved => notify::bid_approved(ctx.bid_user_id, &ctx.tender_title, bid_id),
        _ => notify::bid_rejected(ctx.bid_user_id, &ctx.tender_title, bid_id, reason.as_deref()),
    };
    notify::insert(&mut *tx, &notification).await?;

    let bid = fetch_bid(&mut *tx, bid_id).await?;
    tx.commit().await?;

    tracing::info!("Bid {} on tender {} is now {:?}", bid_id, ctx.tender_id, next);

    Ok(bid)
}

/// Bids visible to `viewer` on a tender: all of them for the owner or an admin,
/// otherwise only the viewer's own bids.
pub async fn list_for_tender(
    pool: &SqlitePool,
    viewer: &User,
    tender_id: i64,
) -> Result<Vec<TenderBid>, AppError> {
    let owner_id: i64 = sqlx::query_scalar("SELECT user_id FROM tenders WHERE id = ?")
        .bind(tender_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Tender not found".to_string()))?;

    let bids = if owner_id == viewer.id || viewer.is_admin {
        sqlx::query_as::<_, TenderBid>(&format!(
            "{BID_SELECT} WHERE b.tender_id = ? ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(tender_id)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, TenderBid>(&format!(
            "{BID_SELECT} WHERE b.tender_id = ? AND b.user_id = ? ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(tender_id)
        .bind(viewer.id)
        .fetch_all(pool)
        .await?
    };

    Ok(bids)
}

/// Every bid the user has placed, newest first.
pub async fn list_by_bidder(pool: &SqlitePool, user_id: i64) -> Result<Vec<TenderBid>, AppError> {
    let bids = sqlx::query_as::<_, TenderBid>(&format!(
        "{BID_SELECT} WHERE b.user_id = ? ORDER BY b.created_at DESC, b.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(bids)
}
