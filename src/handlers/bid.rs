// src/handlers/bid.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::bid::{CreateBidRequest, RejectBidRequest},
    services::bids::{self, BidDecision},
    utils::{
        jwt::CurrentUser,
        validated::{ValidatedJson, optional_json},
    },
};

/// Submits a bid on a tender.
/// 400 for an invalid body (including missing documents), 404 for a missing tender,
/// 403 when bidding on one's own tender.
pub async fn create_bid(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(tender_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CreateBidRequest>,
) -> Result<impl IntoResponse, AppError> {
    let bid = bids::submit_bid(&pool, user.id, tender_id, payload).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// Lists bids on a tender as seen by the requester.
pub async fn list_tender_bids(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(tender_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bids = bids::list_for_tender(&pool, &user, tender_id).await?;
    Ok(Json(bids))
}

/// Lists the requester's own bids across all tenders.
pub async fn list_my_bids(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(bids::list_by_bidder(&pool, user.id).await?))
}

/// Approves a pending bid. Tender owner only.
pub async fn approve_bid(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(bid_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bid = bids::decide_bid(&pool, user.id, bid_id, BidDecision::Approve).await?;
    Ok(Json(bid))
}

/// Rejects a pending bid with an optional reason. Tender owner only.
/// An empty body is accepted.
pub async fn reject_bid(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(bid_id): Path<i64>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: RejectBidRequest = optional_json(&body)?;
    let decision = BidDecision::Reject {
        reason: payload.reason,
    };
    let bid = bids::decide_bid(&pool, user.id, bid_id, decision).await?;
    Ok(Json(bid))
}
