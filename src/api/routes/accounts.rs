//! Account Routes
//!
//! - GET /api/v1/accounts - List all profiles
//! - GET /api/v1/accounts/:uid - One profile
//! - PUT /api/v1/accounts/me - Update the caller's profile
//! - PUT /api/v1/accounts/me/presence - Set the caller's online flag
//! - GET /api/v1/accounts/me/notes - The caller's notes
//! - POST /api/v1/accounts/me/notes - Add a note
//! - DELETE /api/v1/accounts/me/notes/:id - Delete a note

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{NoteRequest, OkResponse, PresenceRequest, UpdateProfileRequest};
use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::{Note, Profile, UpdateProfile};

/// GET /api/v1/accounts
pub async fn list_profiles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Profile>>> {
    Ok(Json(state.accounts.list_profiles().await?))
}

/// GET /api/v1/accounts/:uid
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.accounts.profile(&uid).await?))
}

/// PUT /api/v1/accounts/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let uid = require_user(&state, &headers).await?;
    let changes = UpdateProfile {
        username: req.username,
        avatar_id: req.avatar_id,
    };
    Ok(Json(state.accounts.update_profile(&uid, changes).await?))
}

/// PUT /api/v1/accounts/me/presence
pub async fn set_presence(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PresenceRequest>,
) -> ApiResult<Json<OkResponse>> {
    let uid = require_user(&state, &headers).await?;
    state.accounts.set_presence(&uid, req.online).await?;
    Ok(Json(OkResponse::new()))
}

/// GET /api/v1/accounts/me/notes
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Note>>> {
    let uid = require_user(&state, &headers).await?;
    Ok(Json(state.accounts.list_notes(&uid).await?))
}

/// POST /api/v1/accounts/me/notes
pub async fn add_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NoteRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let uid = require_user(&state, &headers).await?;
    let note = state.accounts.add_note(&uid, &req.title, &req.body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /api/v1/accounts/me/notes/:id
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(note_id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let uid = require_user(&state, &headers).await?;
    state.accounts.delete_note(&uid, &note_id).await?;
    Ok(Json(OkResponse::new()))
}
