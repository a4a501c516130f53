// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserType},
    utils::{
        hash::{hash_password, verify_password},
        html::clean_optional,
        jwt::{CurrentUser, sign_jwt},
        validated::ValidatedJson,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user (excluding password) and a token.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, password, user_type, full_name)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.username)
    .bind(&email)
    .bind(hashed_password)
    .bind(payload.user_type.unwrap_or(UserType::Individual))
    .bind(clean_optional(payload.full_name))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username or email already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let user = User::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::InternalServerError(format!(
            "user {} vanished after insert",
            id
        )))?;
    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!("New user registered: {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Authenticates a user by username or email and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_login(&pool, payload.username.trim())
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::from(e)
        })?;

    // Same message for unknown user and wrong password.
    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password) => user,
        _ => {
            tracing::debug!("Failed login attempt for {}", payload.username);
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(AuthResponse { user, token }))
}

/// Returns the authenticated user.
pub async fn me(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user))
}
