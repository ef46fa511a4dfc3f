//! Quiz Routes
//!
//! - GET /api/v1/quiz/categories - Available categories
//! - POST /api/v1/quiz/start - Start a session, returns the first question
//! - GET /api/v1/quiz/:session/question - The current question
//! - POST /api/v1/quiz/:session/answer - Submit an answer

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AnswerRequest, StartQuizRequest, StartQuizResponse};
use crate::api::error::ApiResult;
use crate::api::routes::require_user;
use crate::api::state::AppState;
use crate::services::{AnswerOutcome, CurrentQuestion, QuizCategory};

/// GET /api/v1/quiz/categories
pub async fn categories() -> Json<&'static [&'static str]> {
    Json(QuizCategory::all())
}

/// POST /api/v1/quiz/start
pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<StartQuizRequest>,
) -> ApiResult<(StatusCode, Json<StartQuizResponse>)> {
    let uid = require_user(&state, &headers).await?;
    let category = QuizCategory::parse(&req.category)?;
    let (session_id, question) = state.quiz.start(&uid, category).await?;
    Ok((
        StatusCode::CREATED,
        Json(StartQuizResponse {
            session_id,
            question,
        }),
    ))
}

/// GET /api/v1/quiz/:session/question
pub async fn current_question(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> ApiResult<Json<CurrentQuestion>> {
    require_user(&state, &headers).await?;
    Ok(Json(state.quiz.current(&session_id).await?))
}

/// POST /api/v1/quiz/:session/answer
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerOutcome>> {
    require_user(&state, &headers).await?;
    Ok(Json(state.quiz.answer(&session_id, &req.answer).await?))
}
