//! File upload routes and helpers.
//!
//! Uploads land in the configured upload directory and are served back under
//! `/uploads/`. Stored names are generated server-side; only the extension
//! of the client's file name survives, whitelisted.

use axum::{Json, extract::Multipart, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Extensions accepted for uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "pdf"];

/// Maximum upload size in bytes (8 MiB).
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Read the `file` field from a multipart body and persist it.
///
/// Returns the relative URL of the stored file.
///
/// # Errors
///
/// Returns 400 when the field is missing, the extension is not allowed, or
/// the file is too large.
pub async fn save_upload(
    state: &AppState,
    mut multipart: Multipart,
    prefix: &str,
) -> Result<String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit('.').next())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "file type .{extension} is not allowed"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest("file is too large".to_owned()));
        }

        let file_name = format!("{prefix}-{}.{extension}", Utc::now().timestamp_millis());
        let path = state.config().upload_dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store upload: {e}")))?;

        return Ok(format!("/uploads/{file_name}"));
    }

    Err(AppError::BadRequest("missing file field".to_owned()))
}

/// Response carrying the stored file URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
}

/// Upload a product image.
///
/// POST /api/uploads (admin, multipart, field `file`)
///
/// # Errors
///
/// Returns 400 for missing/oversized/disallowed files.
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let url = save_upload(&state, multipart, "product").await?;
    Ok(Json(UploadResponse { url }))
}
