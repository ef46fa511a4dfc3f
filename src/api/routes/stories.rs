//! Story Routes
//!
//! - GET /api/v1/stories - Stories younger than 24 hours, newest first
//! - POST /api/v1/stories - Post a story

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::PostStoryRequest;
use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::StoryView;

/// GET /api/v1/stories
pub async fn active_stories(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<StoryView>>> {
    Ok(Json(state.stories.active_stories().await?))
}

/// POST /api/v1/stories
pub async fn post_story(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PostStoryRequest>,
) -> ApiResult<(StatusCode, Json<StoryView>)> {
    let uid = require_user(&state, &headers).await?;
    let story = state
        .stories
        .post_story(&uid, &req.image_id, req.caption)
        .await?;
    Ok((StatusCode::CREATED, Json(story)))
}
