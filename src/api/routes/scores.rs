//! Score Routes
//!
//! - GET /api/v1/leaderboard - All records, best first
//! - GET /api/v1/scores/me - The caller's record
//! - GET /api/v1/scores/:uid - One user's record

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::{LeaderboardEntry, ScoreRecord};

/// GET /api/v1/leaderboard
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.scores.leaderboard().await?))
}

/// GET /api/v1/scores/me
pub async fn my_score(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ScoreRecord>> {
    let uid = require_user(&state, &headers).await?;
    Ok(Json(state.scores.score_of(&uid).await?))
}

/// GET /api/v1/scores/:uid
pub async fn user_score(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<ScoreRecord>> {
    Ok(Json(state.scores.score_of(&uid).await?))
}
