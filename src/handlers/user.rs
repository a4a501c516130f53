// src/handlers/user.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, is_unique_violation},
    handlers::page,
    models::user::{PublicProfile, USER_COLUMNS, UpdateProfileRequest, User},
    utils::{html::clean_optional, jwt::CurrentUser, validated::ValidatedJson},
};

/// Public profile of any user.
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicProfile::from(user)))
}

/// Lets the authenticated user edit their own profile.
pub async fn update_me(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");
    let mut changed = false;

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email.trim().to_lowercase());
        changed = true;
    }
    if let Some(full_name) = payload.full_name {
        separated.push("full_name = ");
        separated.push_bind_unseparated(clean_optional(Some(full_name)));
        changed = true;
    }
    if let Some(phone) = payload.phone {
        separated.push("phone = ");
        separated.push_bind_unseparated(clean_optional(Some(phone)));
        changed = true;
    }
    if let Some(location) = payload.location {
        separated.push("location = ");
        separated.push_bind_unseparated(clean_optional(Some(location)));
        changed = true;
    }
    if let Some(bio) = payload.bio {
        separated.push("bio = ");
        separated.push_bind_unseparated(clean_optional(Some(bio)));
        changed = true;
    }
    if let Some(avatar) = payload.avatar {
        separated.push("avatar = ");
        separated.push_bind_unseparated(clean_optional(Some(avatar)));
        changed = true;
    }
    if let Some(user_type) = payload.user_type {
        separated.push("user_type = ");
        separated.push_bind_unseparated(user_type);
        changed = true;
    }

    if !changed {
        return Ok(Json(user));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(user.id);

    builder.build().execute(&pool).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email is already in use".to_string())
        } else {
            tracing::error!("Failed to update profile of user {}: {:?}", user.id, e);
            AppError::from(e)
        }
    })?;

    let updated = User::find_by_id(&pool, user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(updated))
}

#[derive(Debug, Default, Deserialize)]
pub struct TopSpecialistsParams {
    pub limit: Option<i64>,
}

/// Users flagged as top specialists, best rated first.
pub async fn top_specialists(
    State(pool): State<SqlitePool>,
    Query(params): Query<TopSpecialistsParams>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, _) = page(params.limit, None);

    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE is_top_specialist = 1
        ORDER BY rating DESC, completed_projects DESC, id ASC
        LIMIT ?
        "#
    ))
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    let profiles: Vec<PublicProfile> = users.into_iter().map(PublicProfile::from).collect();
    Ok(Json(profiles))
}
