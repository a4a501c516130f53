// src/handlers/marketplace.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    handlers::{non_blank, page},
    models::listing::{
        CreateListingRequest, LISTING_SELECT, ListingListParams, MarketplaceListing,
        UpdateListingRequest,
    },
    services::moderation::{Viewer, push_visibility},
    utils::{
        html::{clean_html, clean_optional},
        json_list::StringList,
        jwt::{CurrentUser, MaybeUser},
        validated::ValidatedJson,
    },
};

async fn fetch_listing(pool: &SqlitePool, id: i64) -> Result<MarketplaceListing, AppError> {
    sqlx::query_as::<_, MarketplaceListing>(&format!("{LISTING_SELECT} WHERE l.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Listing not found".to_string()))
}

fn build_list_query<'a>(
    params: &'a ListingListParams,
    viewer: &Viewer,
) -> QueryBuilder<'a, Sqlite> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(LISTING_SELECT);
    builder.push(" WHERE 1 = 1");

    push_visibility(&mut builder, "l", viewer, params.show_all, params.user_id);

    if let Some(category) = non_blank(&params.category) {
        builder.push(" AND l.category = ");
        builder.push_bind(category);
    }
    if let Some(subcategory) = non_blank(&params.subcategory) {
        builder.push(" AND l.subcategory = ");
        builder.push_bind(subcategory);
    }
    if let Some(listing_type) = params.listing_type {
        builder.push(" AND l.listing_type = ");
        builder.push_bind(listing_type);
    }
    if let Some(location) = non_blank(&params.location) {
        builder.push(" AND l.location LIKE ");
        builder.push_bind(format!("%{}%", location));
    }
    if let Some(search) = non_blank(&params.search) {
        let pattern = format!("%{}%", search);
        builder.push(" AND (l.title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR l.description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(min_price) = params.min_price {
        builder.push(" AND l.price >= ");
        builder.push_bind(min_price);
    }
    if let Some(max_price) = params.max_price {
        builder.push(" AND l.price <= ");
        builder.push_bind(max_price);
    }
    if let Some(user_id) = params.user_id {
        builder.push(" AND l.user_id = ");
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

/// Lists marketplace ads (sell / rent / buy).
pub async fn list_listings(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Query(params): Query<ListingListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = Viewer::from(&user);
    let listings: Vec<MarketplaceListing> = build_list_query(&params, &viewer)
        .build_query_as()
        .fetch_all(&pool)
        .await?;

    Ok(Json(listings))
}

/// Creates a listing in `pending` moderation state.
pub async fn create_listing(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO marketplace_listings
        (user_id, title, description, category, subcategory, price, listing_type, location, images)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(clean_html(&payload.title))
    .bind(clean_html(&payload.description))
    .bind(payload.category.trim())
    .bind(clean_optional(payload.subcategory))
    .bind(payload.price)
    .bind(payload.listing_type)
    .bind(payload.location.trim())
    .bind(StringList::new(payload.images))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create listing: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("User {} created listing {}", user.id, id);

    Ok((StatusCode::CREATED, Json(fetch_listing(&pool, id).await?)))
}

pub async fn get_listing(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let listing = fetch_listing(&pool, id).await?;

    if !Viewer::from(&user).can_view(listing.moderation_status, listing.user_id) {
        return Err(AppError::NotFound("Listing not found".to_string()));
    }

    Ok(Json(listing))
}

/// Updates a listing. Owner or admin only.
pub async fn update_listing(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_listing(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this listing".to_string(),
        ));
    }

    if payload.is_empty() {
        return Ok(Json(existing));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE marketplace_listings SET ");
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
    if let Some(price) = payload.price {
        separated.push("price = ");
        separated.push_bind_unseparated(price);
    }
    if let Some(listing_type) = payload.listing_type {
        separated.push("listing_type = ");
        separated.push_bind_unseparated(listing_type);
    }
    if let Some(location) = payload.location {
        separated.push("location = ");
        separated.push_bind_unseparated(location.trim().to_string());
    }
    if let Some(images) = payload.images {
        separated.push("images = ");
        separated.push_bind_unseparated(StringList::new(images));
    }
    separated.push("updated_at = CURRENT_TIMESTAMP");

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update listing {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(Json(fetch_listing(&pool, id).await?))
}

/// Deletes a listing. Owner or admin only.
pub async fn delete_listing(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id: i64 = sqlx::query_scalar("SELECT user_id FROM marketplace_listings WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Listing not found".to_string()))?;

    if owner_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this listing".to_string(),
        ));
    }

    sqlx::query("DELETE FROM marketplace_listings WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
