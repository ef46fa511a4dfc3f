//! Writing Tool Routes
//!
//! All five tools return 503 when no model gateway is configured.
//!
//! - POST /api/v1/tools/grammar - Correct grammar, reporting fixes
//! - POST /api/v1/tools/paraphrase - Rewrite in a chosen register
//! - POST /api/v1/tools/dictionary - Define a word
//! - POST /api/v1/tools/essay - Sentence-by-sentence essay check
//! - POST /api/v1/tools/humanize - Rewrite stiff text naturally

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use crate::ai::{Definition, EssayReport, GrammarReport, WritingTools};
use crate::api::dto::{DefineRequest, ParaphraseRequest, TextRequest, TextResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::require_user;
use crate::api::state::AppState;

fn tools_of(state: &AppState) -> ApiResult<&Arc<WritingTools>> {
    state.tools.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("no model gateway configured".to_string())
    })
}

/// POST /api/v1/tools/grammar
pub async fn grammar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<GrammarReport>> {
    require_user(&state, &headers).await?;
    let tools = tools_of(&state)?;
    Ok(Json(tools.correct_grammar(&req.text).await?))
}

/// POST /api/v1/tools/paraphrase
pub async fn paraphrase(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ParaphraseRequest>,
) -> ApiResult<Json<TextResponse>> {
    require_user(&state, &headers).await?;
    let tools = tools_of(&state)?;
    let text = tools.paraphrase(&req.text, req.mode).await?;
    Ok(Json(TextResponse { text }))
}

/// POST /api/v1/tools/dictionary
pub async fn dictionary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DefineRequest>,
) -> ApiResult<Json<Definition>> {
    require_user(&state, &headers).await?;
    let tools = tools_of(&state)?;
    Ok(Json(tools.define_word(&req.word).await?))
}

/// POST /api/v1/tools/essay
pub async fn essay(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<EssayReport>> {
    require_user(&state, &headers).await?;
    let tools = tools_of(&state)?;
    Ok(Json(tools.check_essay(&req.text).await?))
}

/// POST /api/v1/tools/humanize
pub async fn humanize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<TextResponse>> {
    require_user(&state, &headers).await?;
    let tools = tools_of(&state)?;
    let text = tools.humanize(&req.text).await?;
    Ok(Json(TextResponse { text }))
}
