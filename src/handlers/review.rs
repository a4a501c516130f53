// src/handlers/review.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    db,
    error::{AppError, is_unique_violation},
    models::review::{CreateReviewRequest, CreateReviewResponse, REVIEW_SELECT, Review},
    services::rating,
    utils::{html::clean_optional, jwt::CurrentUser, validated::ValidatedJson},
};

/// Leaves a review and recomputes the reviewee's rating in the same transaction.
pub async fn create_review(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.reviewee_id == user.id {
        return Err(AppError::BadRequest("You cannot review yourself".to_string()));
    }

    let mut tx = db::begin_write(&pool).await?;

    let reviewee: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(payload.reviewee_id)
        .fetch_optional(&mut *tx)
        .await?;
    if reviewee.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Some(tender_id) = payload.tender_id {
        let tender: Option<i64> = sqlx::query_scalar("SELECT id FROM tenders WHERE id = ?")
            .bind(tender_id)
            .fetch_optional(&mut *tx)
            .await?;
        if tender.is_none() {
            return Err(AppError::NotFound("Tender not found".to_string()));
        }
    }

    let review_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO reviews (reviewer_id, reviewee_id, tender_id, rating, comment)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(payload.reviewee_id)
    .bind(payload.tender_id)
    .bind(payload.rating)
    .bind(clean_optional(payload.comment))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You have already reviewed this user".to_string())
        } else {
            tracing::error!("Failed to create review: {:?}", e);
            AppError::from(e)
        }
    })?;

    let reviewee_rating = rating::update_user_rating(&mut *tx, payload.reviewee_id).await?;

    let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = ?"))
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "User {} reviewed user {} ({}), rating now {}",
        user.id,
        payload.reviewee_id,
        payload.rating,
        reviewee_rating
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateReviewResponse {
            review,
            reviewee_rating,
        }),
    ))
}

/// Reviews a user has received, newest first.
pub async fn list_user_reviews(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = sqlx::query_as::<_, Review>(&format!(
        "{REVIEW_SELECT} WHERE r.reviewee_id = ? ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(reviews))
}
