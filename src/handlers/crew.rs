// src/handlers/crew.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    handlers::specialist::push_directory_filters,
    models::{
        crew::{CREW_SELECT, CreateCrewRequest, Crew, UpdateCrewRequest},
        specialist::DirectoryListParams,
    },
    services::moderation::Viewer,
    utils::{
        html::clean_html,
        json_list::StringList,
        jwt::{CurrentUser, MaybeUser},
        validated::ValidatedJson,
    },
};

async fn fetch_crew(pool: &SqlitePool, id: i64) -> Result<Crew, AppError> {
    sqlx::query_as::<_, Crew>(&format!("{CREW_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Crew not found".to_string()))
}

pub async fn list_crews(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Query(params): Query<DirectoryListParams>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = Viewer::from(&user);
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(CREW_SELECT);
    push_directory_filters(&mut builder, "c", &params, &viewer);

    let crews: Vec<Crew> = builder.build_query_as().fetch_all(&pool).await?;
    Ok(Json(crews))
}

pub async fn create_crew(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateCrewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO crews
        (user_id, name, specializations, members_count, description, location, hourly_rate, images)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(clean_html(&payload.name))
    .bind(StringList::new(payload.specializations))
    .bind(payload.members_count)
    .bind(clean_html(&payload.description))
    .bind(payload.location.trim())
    .bind(payload.hourly_rate)
    .bind(StringList::new(payload.images))
    .fetch_one(&pool)
    .await?;

    tracing::info!("User {} created crew {}", user.id, id);

    Ok((StatusCode::CREATED, Json(fetch_crew(&pool, id).await?)))
}

pub async fn get_crew(
    State(pool): State<SqlitePool>,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let crew = fetch_crew(&pool, id).await?;

    if !Viewer::from(&user).can_view(crew.moderation_status, crew.user_id) {
        return Err(AppError::NotFound("Crew not found".to_string()));
    }

    Ok(Json(crew))
}

/// Owner or admin only. Moderation state is left untouched.
pub async fn update_crew(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateCrewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_crew(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this crew".to_string(),
        ));
    }

    if payload.is_empty() {
        return Ok(Json(existing));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE crews SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(clean_html(&name));
    }
    if let Some(specializations) = payload.specializations {
        separated.push("specializations = ");
        separated.push_bind_unseparated(StringList::new(specializations));
    }
    if let Some(members_count) = payload.members_count {
        separated.push("members_count = ");
        separated.push_bind_unseparated(members_count);
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
    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update crew {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(Json(fetch_crew(&pool, id).await?))
}

pub async fn delete_crew(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let existing = fetch_crew(&pool, id).await?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this crew".to_string(),
        ));
    }

    sqlx::query("DELETE FROM crews WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
