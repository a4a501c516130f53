// src/handlers/admin.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Map, Value, json};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::{
        moderation::{ModeratedKind, ModerationDecision, ModerationStatus},
        user::{AdminUpdateUserRequest, USER_COLUMNS, User},
    },
    services::moderation,
    utils::{
        jwt::CurrentUser,
        validated::{ValidatedJson, optional_json},
    },
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// Toggles account flags and the wallet balance.
/// Admin only. An admin cannot drop their own admin flag.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if id == admin.id && payload.is_admin == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot revoke your own admin rights".to_string(),
        ));
    }

    let target = User::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");
    let mut changed = false;

    if let Some(is_admin) = payload.is_admin {
        separated.push("is_admin = ");
        separated.push_bind_unseparated(is_admin);
        changed = true;
    }
    if let Some(is_verified) = payload.is_verified {
        separated.push("is_verified = ");
        separated.push_bind_unseparated(is_verified);
        changed = true;
    }
    if let Some(is_top_specialist) = payload.is_top_specialist {
        separated.push("is_top_specialist = ");
        separated.push_bind_unseparated(is_top_specialist);
        changed = true;
    }
    if let Some(wallet_balance) = payload.wallet_balance {
        separated.push("wallet_balance = ");
        separated.push_bind_unseparated(wallet_balance);
        changed = true;
    }
    if let Some(completed_projects) = payload.completed_projects {
        separated.push("completed_projects = ");
        separated.push_bind_unseparated(completed_projects);
        changed = true;
    }

    if !changed {
        return Ok(Json(target));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.build().execute(&pool).await?;

    tracing::info!("Admin {} updated user {}", admin.id, id);

    let updated = User::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    Ok(Json(updated))
}

/// Dashboard counters.
/// Admin only.
pub async fn stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let totals: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM tenders),
            (SELECT COUNT(*) FROM marketplace_listings),
            (SELECT COUNT(*) FROM tender_bids),
            (SELECT COUNT(*) FROM specialists),
            (SELECT COUNT(*) FROM crews)
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let mut pending = Map::new();
    for kind in ModeratedKind::ALL {
        let count = moderation::count_pending(&pool, kind).await?;
        pending.insert(kind.slug().to_string(), json!(count));
    }

    Ok(Json(json!({
        "users": totals.0,
        "tenders": totals.1,
        "listings": totals.2,
        "bids": totals.3,
        "specialists": totals.4,
        "crews": totals.5,
        "pending": Value::Object(pending),
    })))
}

/// Pending items of one kind (`tenders`, `marketplace`, `specialists`, `crews`).
/// Admin only.
pub async fn moderation_queue(
    State(pool): State<SqlitePool>,
    Path(kind): Path<ModeratedKind>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(moderation::list_pending(&pool, kind).await?))
}

pub async fn approve(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path((kind, id)): Path<(ModeratedKind, i64)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let decision: ModerationDecision = optional_json(&body)?;
    let outcome = moderation::moderate(
        &pool,
        kind,
        id,
        admin.id,
        ModerationStatus::Approved,
        decision.comment,
    )
    .await?;

    Ok(Json(outcome))
}

pub async fn reject(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path((kind, id)): Path<(ModeratedKind, i64)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let decision: ModerationDecision = optional_json(&body)?;
    let outcome = moderation::moderate(
        &pool,
        kind,
        id,
        admin.id,
        ModerationStatus::Rejected,
        decision.comment,
    )
    .await?;

    Ok(Json(outcome))
}
