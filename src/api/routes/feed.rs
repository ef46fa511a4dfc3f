//! Feed Routes
//!
//! - GET /api/v1/feed - Global timeline, newest first
//! - POST /api/v1/posts - Create a post
//! - GET /api/v1/posts/:uid/:post_id - One post
//! - DELETE /api/v1/posts/:uid/:post_id - Delete own post
//! - GET /api/v1/posts/:uid/:post_id/comments - Comments, oldest first
//! - POST /api/v1/posts/:uid/:post_id/comments - Add a comment
//! - POST /api/v1/posts/:uid/:post_id/like - Toggle a like
//! - POST /api/v1/posts/:uid/:post_id/repost - Repost to own timeline

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CommentRequest, CreatePostRequest, LikeResponse, OkResponse};
use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::{Comment, PostView};

/// GET /api/v1/feed
pub async fn timeline(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<PostView>>> {
    Ok(Json(state.feed.timeline().await?))
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    let uid = require_user(&state, &headers).await?;
    let post = state.feed.create_post(&uid, &req.text, req.image_ids).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/posts/:uid/:post_id
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path((uid, post_id)): Path<(String, String)>,
) -> ApiResult<Json<PostView>> {
    Ok(Json(state.feed.get_post(&uid, &post_id).await?))
}

/// DELETE /api/v1/posts/:uid/:post_id
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((uid, post_id)): Path<(String, String)>,
) -> ApiResult<Json<OkResponse>> {
    let requester = require_user(&state, &headers).await?;
    state.feed.delete_post(&requester, &uid, &post_id).await?;
    Ok(Json(OkResponse::new()))
}

/// GET /api/v1/posts/:uid/:post_id/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path((uid, post_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.feed.list_comments(&uid, &post_id).await?))
}

/// POST /api/v1/posts/:uid/:post_id/comments
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((uid, post_id)): Path<(String, String)>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let viewer = require_user(&state, &headers).await?;
    let comment = state
        .feed
        .add_comment(&viewer, &uid, &post_id, &req.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/v1/posts/:uid/:post_id/like
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((uid, post_id)): Path<(String, String)>,
) -> ApiResult<Json<LikeResponse>> {
    let viewer = require_user(&state, &headers).await?;
    let (liked, like_count) = state.feed.toggle_like(&viewer, &uid, &post_id).await?;
    Ok(Json(LikeResponse { liked, like_count }))
}

/// POST /api/v1/posts/:uid/:post_id/repost
pub async fn repost(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((uid, post_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    let viewer = require_user(&state, &headers).await?;
    let post = state.feed.repost(&viewer, &uid, &post_id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}
