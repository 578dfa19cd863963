use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Serve an uploaded image, slip or print PDF.
#[utoipa::path(
    get,
    path = "/{key}",
    tag = "Uploads",
    operation_id = "getUpload",
    summary = "Download an uploaded file",
    params(("key" = String, Path, description = "Content hash with optional extension")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Unknown file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let content = state
        .images
        .fetch(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
