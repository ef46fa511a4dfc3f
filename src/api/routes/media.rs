//! Media Routes
//!
//! - POST /api/v1/media - Upload (base64 inside JSON), returns the ID
//! - GET /media/:id - Serve a stored object with its content type

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use std::sync::Arc;

use crate::api::dto::{MediaUploadRequest, MediaUploadResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::require_user;
use crate::api::state::AppState;

/// POST /api/v1/media
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<MediaUploadRequest>,
) -> ApiResult<(StatusCode, Json<MediaUploadResponse>)> {
    require_user(&state, &headers).await?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.data.as_bytes())
        .map_err(|e| ApiError::Validation(format!("invalid base64 data: {}", e)))?;

    let id = state.media.save(bytes, &req.content_type).await?;
    let url = state.media.url(&id);
    Ok((StatusCode::CREATED, Json(MediaUploadResponse { id, url })))
}

/// GET /media/:id
pub async fn fetch_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let object = state.media.load(&id).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, object.content_type),
            // Content-addressed, so the object never changes
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        object.bytes,
    )
        .into_response())
}
