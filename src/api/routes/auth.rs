//! Auth Routes
//!
//! - POST /api/v1/auth/register - Create an account and sign it in
//! - POST /api/v1/auth/login - Sign in with email and password
//! - POST /api/v1/auth/logout - End the current session

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{OkResponse, RegisterRequest, SignInRequest};
use crate::api::error::ApiResult;
use crate::api::routes::bearer_token;
use crate::api::state::AppState;
use crate::services::Session;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Json<Session>> {
    let session = state.accounts.sign_in(&req.email, &req.password).await?;
    Ok(Json(session))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<OkResponse>> {
    let token = bearer_token(&headers)?;
    state.accounts.sign_out(token).await?;
    Ok(Json(OkResponse::new()))
}
