//! Chat Routes
//!
//! - GET /api/v1/groups - List groups
//! - POST /api/v1/groups - Create a group
//! - GET /api/v1/groups/:name - One group
//! - POST /api/v1/groups/:name/join - Join
//! - POST /api/v1/groups/:name/leave - Leave
//! - GET /api/v1/groups/:name/messages - Messages, oldest first
//! - POST /api/v1/groups/:name/messages - Send a message

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateGroupRequest, OkResponse, SendMessageRequest};
use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::{ChatMessage, GroupView};

/// GET /api/v1/groups
pub async fn list_groups(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<GroupView>>> {
    Ok(Json(state.chat.list_groups().await?))
}

/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupView>)> {
    let uid = require_user(&state, &headers).await?;
    let group = state.chat.create_group(&req.name, &uid).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups/:name
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<GroupView>> {
    Ok(Json(state.chat.group(&name).await?))
}

/// POST /api/v1/groups/:name/join
pub async fn join_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let uid = require_user(&state, &headers).await?;
    state.chat.join(&name, &uid).await?;
    Ok(Json(OkResponse::new()))
}

/// POST /api/v1/groups/:name/leave
pub async fn leave_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let uid = require_user(&state, &headers).await?;
    state.chat.leave(&name, &uid).await?;
    Ok(Json(OkResponse::new()))
}

/// GET /api/v1/groups/:name/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(state.chat.messages(&name).await?))
}

/// POST /api/v1/groups/:name/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let uid = require_user(&state, &headers).await?;
    let message = state
        .chat
        .send(&name, &uid, &req.text, req.attachment_id)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
