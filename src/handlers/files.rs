// src/handlers/files.rs

use std::path::{Path as FsPath, PathBuf};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Request, StatusCode},
    response::IntoResponse,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{Config, MAX_UPLOAD_BYTES},
    error::AppError,
    utils::jwt::CurrentUser,
};

pub const ALLOWED_EXTENSIONS: [&str; 11] = [
    "png", "jpg", "jpeg", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx", "txt",
];

/// Names produced by `stored_name`: `{unix_millis}-{32 hex}.{ext}`.
static STORED_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,16}-[0-9a-f]{32}\.[a-z0-9]{2,5}$").ok());

#[derive(Debug, Deserialize, Validate)]
pub struct UploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// Base64 payload, optionally as a `data:<mime>;base64,` URL.
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub file_name: String,
    pub size: usize,
}

/// Lowercased extension of the client file name, if it is on the whitelist.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Strips an optional data-URL header and decodes the base64 payload.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or(AppError::BadRequest("Malformed data URL".to_string()))?,
        None => data,
    };
    let encoded = encoded.trim();

    // Cheap size check before decoding anything.
    if encoded.len() / 4 * 3 > MAX_UPLOAD_BYTES + 3 {
        return Err(AppError::PayloadTooLarge(
            "File exceeds the 5 MB limit".to_string(),
        ));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::BadRequest("File data is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("File is empty".to_string()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(
            "File exceeds the 5 MB limit".to_string(),
        ));
    }

    Ok(bytes)
}

fn stored_name(ext: &str) -> Result<String, AppError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_millis();
    Ok(format!("{}-{}.{}", millis, Uuid::new_v4().simple(), ext))
}

pub fn is_stored_name(name: &str) -> bool {
    STORED_NAME.as_ref().is_some_and(|re| re.is_match(name)) && allowed_extension(name).is_some()
}

/// Stores a base64 encoded file under the upload directory.
///
/// The body is read as raw bytes so an oversized request surfaces as 413, not as a JSON error.
pub async fn upload(
    State(config): State<Config>,
    user: CurrentUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: UploadRequest = serde_json::from_slice(&body)?;
    payload.validate()?;

    let ext = allowed_extension(&payload.file_name).ok_or(AppError::BadRequest(format!(
        "File type not allowed. Allowed: {}",
        ALLOWED_EXTENSIONS.join(", ")
    )))?;
    let bytes = decode_payload(&payload.data)?;

    let name = stored_name(&ext)?;
    let path = PathBuf::from(&config.upload_dir).join(&name);

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create upload directory {}: {}", config.upload_dir, e);
            AppError::InternalServerError(e.to_string())
        })?;
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        tracing::error!("Failed to write upload {}: {}", path.display(), e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("User {} uploaded {} ({} bytes)", user.id, name, bytes.len());

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: format!("/api/files/{}", name),
            file_name: name,
            size: bytes.len(),
        }),
    ))
}

/// Serves a previously uploaded file to authenticated users.
pub async fn serve(
    State(config): State<Config>,
    _user: CurrentUser,
    Path(filename): Path<String>,
    request: Request<Body>,
) -> Result<impl IntoResponse, AppError> {
    if !is_stored_name(&filename) {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let path = PathBuf::from(&config.upload_dir).join(&filename);
    let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
    if !exists {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    Ok(response.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("Plan.PDF"), Some("pdf".to_string()));
        assert_eq!(allowed_extension("photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(allowed_extension("script.sh"), None);
        assert_eq!(allowed_extension("noext"), None);
    }

    #[test]
    fn test_decode_payload_accepts_data_url() {
        let plain = STANDARD.encode(b"hello");
        assert_eq!(decode_payload(&plain).unwrap(), b"hello");
        let url = format!("data:text/plain;base64,{}", plain);
        assert_eq!(decode_payload(&url).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_payload_rejects_empty_and_garbage() {
        assert!(matches!(decode_payload(""), Err(AppError::BadRequest(_))));
        assert!(matches!(decode_payload("!!!"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let big = STANDARD.encode(vec![0u8; MAX_UPLOAD_BYTES + 1]);
        assert!(matches!(
            decode_payload(&big),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_stored_names() {
        let name = stored_name("png").unwrap();
        assert!(is_stored_name(&name));
        assert!(!is_stored_name("../etc/passwd"));
        assert!(!is_stored_name("..%2F..%2Fsecret.png"));
        assert!(!is_stored_name("1700000000000-abc.png"));
        assert!(!is_stored_name(&name.replace(".png", ".sh")));
    }
}
