// src/utils/jwt.rs

use std::ops::Deref;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{config::Config, error::AppError, models::user::User, state::AppState};

/// JWT Claims structure.
/// The token only identifies the user; roles are always read from the database.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the token and loads the full user row.
async fn authenticate(pool: &SqlitePool, secret: &str, token: &str) -> Result<User, AppError> {
    let claims = verify_jwt(token, secret)?;
    let user_id = claims.user_id()?;

    User::find_by_id(pool, user_id)
        .await?
        .ok_or(AppError::AuthError("User no longer exists".to_string()))
}

/// The authenticated user, re-read from the database on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    Config: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `admin_middleware`.
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(&parts.headers)
            .ok_or(AppError::AuthError("Missing bearer token".to_string()))?;

        let pool = SqlitePool::from_ref(state);
        let config = Config::from_ref(state);
        let user = CurrentUser(authenticate(&pool, &config.jwt_secret, token).await?);

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Optional authentication for public endpoints.
///
/// A missing or invalid token yields `None` instead of a 401, so anonymous browsing keeps
/// working with a stale token in the client.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.is_admin)
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    Config: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if bearer_token(&parts.headers).is_none() {
            return Ok(MaybeUser(None));
        }

        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(AppError::AuthError(reason)) => {
                tracing::debug!("Ignoring invalid token on public route: {}", reason);
                Ok(MaybeUser(None))
            }
            Err(other) => Err(other),
        }
    }
}

/// Axum Middleware: Admin Authorization.
///
/// Authenticates the bearer token, then requires `is_admin` on the freshly loaded user.
/// Returns 401 for a missing/invalid token and 403 for non-admins.
/// The resolved `CurrentUser` is stored in request extensions for the handlers.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(AppError::AuthError("Missing bearer token".to_string()))?;

    let user = authenticate(&state.pool, &state.config.jwt_secret, token).await?;

    if !user.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let token = sign_jwt(42, "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = sign_jwt(42, "secret", 60).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
