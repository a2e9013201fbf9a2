//! File upload API.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::upload::UploadResponse;
use crate::services::uploads::{IncomingFile, UploadError, UploadService};
use crate::state::AppState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "files";

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// `POST /api/upload`
///
/// Stores the first `files` part of a multipart body; other parts are ignored.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut incoming = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        incoming = Some(IncomingFile {
            name,
            mime,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let file = incoming.ok_or(UploadError::NoFile)?;
    let stored = UploadService::new(state.pool(), &state.config().uploads_dir)
        .store(user_id, file)
        .await?;
    Ok(Json(stored.into()))
}
