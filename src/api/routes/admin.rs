//! Admin Routes
//!
//! The back-office surface. Registration is open only until the first
//! admin exists; after that it requires an admin token, like everything
//! else here except login.
//!
//! - POST /api/v1/admin/register - Create an admin account
//! - POST /api/v1/admin/login - Admin login, returns a token
//! - GET /api/v1/admin/accounts - List admin accounts
//! - DELETE /api/v1/admin/accounts/:id - Delete an admin account
//! - POST /api/v1/admin/users/:uid/restrict - Toggle a user's restriction
//! - DELETE /api/v1/admin/users/:uid - Delete a user account
//! - GET /api/v1/admin/analytics - Usage report

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    AdminLoginRequest, AdminRegisterRequest, AdminTokenResponse, OkResponse, RestrictRequest,
};
use crate::api::error::ApiResult;
use crate::api::routes::require_admin;
use crate::api::state::AppState;
use crate::services::{AdminView, UsageReport};

/// POST /api/v1/admin/register
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AdminRegisterRequest>,
) -> ApiResult<(StatusCode, Json<AdminView>)> {
    // Bootstrap: the very first admin registers without a token
    if !state.admin.list_admins().await?.is_empty() {
        require_admin(&state, &headers).await?;
    }
    let view = state.admin.register_admin(&req.name, &req.password).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/v1/admin/login
pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<Json<AdminTokenResponse>> {
    let token = state.admin.login_admin(&req.name, &req.password).await?;
    Ok(Json(AdminTokenResponse { token }))
}

/// GET /api/v1/admin/accounts
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<AdminView>>> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.list_admins().await?))
}

/// DELETE /api/v1/admin/accounts/:id
pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    require_admin(&state, &headers).await?;
    state.admin.delete_admin(&id).await?;
    Ok(Json(OkResponse::new()))
}

/// POST /api/v1/admin/users/:uid/restrict
pub async fn set_restricted(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
    Json(req): Json<RestrictRequest>,
) -> ApiResult<Json<OkResponse>> {
    require_admin(&state, &headers).await?;
    state.admin.set_restricted(&uid, req.restricted).await?;
    Ok(Json(OkResponse::new()))
}

/// DELETE /api/v1/admin/users/:uid
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(uid): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    require_admin(&state, &headers).await?;
    state.admin.delete_account(&uid).await?;
    Ok(Json(OkResponse::new()))
}

/// GET /api/v1/admin/analytics
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<UsageReport>> {
    require_admin(&state, &headers).await?;
    Ok(Json(state.admin.analytics().await?))
}
