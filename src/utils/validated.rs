// src/utils/validated.rs

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed bodies, missing fields and failed validation all become `AppError::BadRequest`,
/// so clients see a uniform 400 instead of axum's 415/422 rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Parses an optional JSON body: an empty body yields `T::default()`.
/// Used by endpoints whose body only carries optional fields (reject reason, moderation comment).
pub fn optional_json<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value: T = serde_json::from_slice(body)?;
    value.validate()?;
    Ok(value)
}
