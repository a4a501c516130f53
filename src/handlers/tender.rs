// src/handlers/tender.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    db,
    error::AppError,
    handlers::{non_blank, page},
    models::tender::{
        CreateTenderRequest, TENDER_SELECT, Tender, TenderListParams, UpdateTenderRequest,
    },
    services::{
        moderation::{Viewer, push_visibility},
        rating,
    },
    utils::{
        html::{clean_html, clean_optional},
        json_list::StringList,
        jwt::{CurrentUser, MaybeUser},
        validated::ValidatedJson,
    },
};

pub(crate) async fn fetch_tender(pool: &SqlitePool, id: i64) -> Result<Tender, AppError> {
    sqlx::query_as::<_, Tender>(&format!("{TENDER_SELECT} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Tender not found".to_string()))
}

/// Builds the filtered tender list query.
fn build_list_query<'a>(params: &'a TenderListParams, viewer: &Viewer) -> QueryBuilder<'a, Sqlite> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(TENDER_SELECT);
    builder.push(" WHERE 1 = 1");

    push_visibility(&mut builder, "t", viewer, params.show_all, params.user_id);

    if let Some(category) = non_blank(&params.category) {
        builder.push(" AND t.category = ");
        builder.push_bind(category);
    }
    if let Some(subcategory) = non_blank(&params.subcategory) {
        builder.push(" AND t.subcategory = ");
        builder.push_bind(subcategory);
    }
    if let Some(location) = non_blank(&params.location) {
        builder.push(" AND t.location LIKE ");
        builder.push_bind(format!("%{}%", location));
    }
    if let Some(status) = params.status {
        builder.push(" AND t.status = ");
        builder.push_bind(status);
    }
    if let Some(search) = non_blank(&params.search) {
        let pattern = format!("%{}%", search);
        builder.push(" AND (t.title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR t.description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(min_budget) = params.min_budget {
        builder.push(" AND t.budget >= ");
        builder.push_bind(min_budget);
    }
    if let Some(max_budget) = params.max_budget {
        builder.push(" AND t.budget <= ");
        builder.push_bind(max_budget);
    }
    if let Some(user_id) = params.user_id {
        builder.push(" AND t.user_id = ");
        builder.push_bind(user_id);
    }

    let (limit, offset) = page(params.limit, params.offset);
    builder.push(params.sort.order_by());
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder
}

/// Lists tenders. Anonymous and regular users only see approved tenders.
pub async fn list_tenders(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Query(params): Query<TenderListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = Viewer::from(&user);
    let tenders: Vec<Tender> = build_list_query(&params, &viewer)
        .build_query_as()
        .fetch_all(&pool)
        .await?;

    Ok(Json(tenders))
}

/// Creates a tender. It stays invisible to the public until an admin approves it.
pub async fn create_tender(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateTenderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tenders
        (user_id, title, description, category, subcategory, budget, location, deadline, images)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(clean_html(&payload.title))
    .bind(clean_html(&payload.description))
    .bind(payload.category.trim())
    .bind(clean_optional(payload.subcategory))
    .bind(payload.budget)
    .bind(payload.location.trim())
    .bind(payload.deadline)
    .bind(StringList::new(payload.images))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create tender: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("User {} created tender {} (pending moderation)", user.id, id);

    let tender = fetch_tender(&pool, id).await?;
    Ok((StatusCode::CREATED, Json(tender)))
}

/// Gets a tender. Unapproved tenders are only visible to their owner and admins.
pub async fn get_tender(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let tender = fetch_tender(&pool, id).await?;

    if !Viewer::from(&user).can_view(tender.moderation_status, tender.user_id) {
        return Err(AppError::NotFound("Tender not found".to_string()));
    }

    Ok(Json(tender))
}

/// Updates a tender. Owner or admin only.
pub async fn update_tender(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateTenderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_tender(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this tender".to_string(),
        ));
    }

    if payload.is_empty() {
        return Ok(Json(existing));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tenders SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }
    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }
    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category.trim().to_string());
    }
    if let Some(subcategory) = payload.subcategory {
        separated.push("subcategory = ");
        separated.push_bind_unseparated(clean_optional(Some(subcategory)));
    }
    if let Some(budget) = payload.budget {
        separated.push("budget = ");
        separated.push_bind_unseparated(budget);
    }
    if let Some(location) = payload.location {
        separated.push("location = ");
        separated.push_bind_unseparated(location.trim().to_string());
    }
    if let Some(deadline) = payload.deadline {
        separated.push("deadline = ");
        separated.push_bind_unseparated(deadline);
    }
    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }
    if let Some(images) = payload.images {
        separated.push("images = ");
        separated.push_bind_unseparated(StringList::new(images));
    }
    separated.push("updated_at = CURRENT_TIMESTAMP");

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update tender {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(Json(fetch_tender(&pool, id).await?))
}

/// Deletes a tender and its bids. Owner or admin only.
pub async fn delete_tender(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = db::begin_write(&pool).await?;

    let owner_id: i64 = sqlx::query_scalar("SELECT user_id FROM tenders WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Tender not found".to_string()))?;

    if owner_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this tender".to_string(),
        ));
    }

    // Reviews tied to the tender go with it; the reviewees' ratings follow.
    let reviewees: Vec<i64> =
        sqlx::query_scalar("SELECT DISTINCT reviewee_id FROM reviews WHERE tender_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
    sqlx::query("DELETE FROM reviews WHERE tender_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tender_bids WHERE tender_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tenders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for reviewee in reviewees {
        rating::update_user_rating(&mut *tx, reviewee).await?;
    }

    tx.commit().await?;
    tracing::info!("Tender {} deleted by user {}", id, user.id);

    Ok(StatusCode::NO_CONTENT)
}
