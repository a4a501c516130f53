// src/handlers/specialist.rs

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
    models::specialist::{
        CreateSpecialistRequest, DirectoryListParams, SPECIALIST_SELECT, Specialist,
        UpdateSpecialistRequest,
    },
    services::moderation::{Viewer, push_visibility},
    utils::{
        html::clean_html,
        json_list::StringList,
        jwt::{CurrentUser, MaybeUser},
        validated::ValidatedJson,
    },
};

/// Filters shared by the specialist and crew directories, followed by ordering and paging.
/// `alias` is the table alias used in the SELECT.
pub(crate) fn push_directory_filters<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    alias: &str,
    params: &'a DirectoryListParams,
    viewer: &Viewer,
) {
    builder.push(" WHERE 1 = 1");
    push_visibility(builder, alias, viewer, params.show_all, params.user_id);

    if let Some(location) = non_blank(&params.location) {
        builder.push(format!(" AND {alias}.location LIKE "));
        builder.push_bind(format!("%{}%", location));
    }
    if let Some(search) = non_blank(&params.search) {
        let pattern = format!("%{}%", search);
        builder.push(format!(" AND ({alias}.name LIKE "));
        builder.push_bind(pattern.clone());
        builder.push(format!(" OR {alias}.description LIKE "));
        builder.push_bind(pattern);
        builder.push(")");
    }
    // Array columns hold canonical JSON, so an exact entry appears as "value".
    if let Some(specialization) = non_blank(&params.specialization) {
        builder.push(format!(" AND {alias}.specializations LIKE "));
        builder.push_bind(format!("%{}%", serde_json::Value::from(specialization)));
    }
    if let Some(user_id) = params.user_id {
        builder.push(format!(" AND {alias}.user_id = "));
        builder.push_bind(user_id);
    }

    let (limit, offset) = page(params.limit, params.offset);
    builder.push(format!(" ORDER BY {alias}.created_at DESC, {alias}.id DESC LIMIT "));
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);
}

async fn fetch_specialist(pool: &SqlitePool, id: i64) -> Result<Specialist, AppError> {
    sqlx::query_as::<_, Specialist>(&format!("{SPECIALIST_SELECT} WHERE s.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Specialist not found".to_string()))
}

fn trimmed(items: Vec<String>) -> StringList {
    StringList::new(items.into_iter().map(|s| s.trim().to_string()).collect())
}

pub async fn list_specialists(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Query(params): Query<DirectoryListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = Viewer::from(&user);
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SPECIALIST_SELECT);
    push_directory_filters(&mut builder, "s", &params, &viewer);

    let specialists: Vec<Specialist> = builder.build_query_as().fetch_all(&pool).await?;
    Ok(Json(specialists))
}

/// Adds a directory profile; pending until moderated.
pub async fn create_specialist(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateSpecialistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO specialists
        (user_id, name, specializations, experience_years, description, location, hourly_rate, images)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(clean_html(&payload.name))
    .bind(trimmed(payload.specializations))
    .bind(payload.experience_years)
    .bind(clean_html(&payload.description))
    .bind(payload.location.trim())
    .bind(payload.hourly_rate)
    .bind(StringList::new(payload.images))
    .fetch_one(&pool)
    .await?;

    tracing::info!("User {} created specialist profile {}", user.id, id);

    Ok((StatusCode::CREATED, Json(fetch_specialist(&pool, id).await?)))
}

pub async fn get_specialist(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let specialist = fetch_specialist(&pool, id).await?;

    if !Viewer::from(&user).can_view(specialist.moderation_status, specialist.user_id) {
        return Err(AppError::NotFound("Specialist not found".to_string()));
    }

    Ok(Json(specialist))
}

pub async fn update_specialist(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateSpecialistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_specialist(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this profile".to_string(),
        ));
    }

    if payload.is_empty() {
        return Ok(Json(existing));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE specialists SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(clean_html(&name));
    }
    if let Some(specializations) = payload.specializations {
        separated.push("specializations = ");
        separated.push_bind_unseparated(trimmed(specializations));
    }
    if let Some(experience_years) = payload.experience_years {
        separated.push("experience_years = ");
        separated.push_bind_unseparated(experience_years);
    }
    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }
    if let Some(location) = payload.location {
        separated.push("location = ");
        separated.push_bind_unseparated(location.trim().to_string());
    }
    if let Some(hourly_rate) = payload.hourly_rate {
        separated.push("hourly_rate = ");
        separated.push_bind_unseparated(hourly_rate);
    }
    if let Some(images) = payload.images {
        separated.push("images = ");
        separated.push_bind_unseparated(StringList::new(images));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.build().execute(&pool).await?;

    Ok(Json(fetch_specialist(&pool, id).await?))
}

pub async fn delete_specialist(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_specialist(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this profile".to_string(),
        ));
    }

    sqlx::query("DELETE FROM specialists WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
