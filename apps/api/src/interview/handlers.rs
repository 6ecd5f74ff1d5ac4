use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::session::{self, EarlyEnd, SessionView};
use crate::interview::state::CandidateReply;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndInterviewRequest {
    #[serde(default)]
    pub auto_ended: bool,
    pub reason: Option<String>,
}

/// POST /api/v1/interviews
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<Json<SessionView>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(Json(session::start(&state, &req.name).await?))
}

/// GET /api/v1/interviews/:id
pub async fn handle_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session::progress(&state, id).await?))
}

/// POST /api/v1/interviews/:id/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let reply = CandidateReply::Answer(req.answer.trim().to_string());
    Ok(Json(session::answer(&state, id, reply).await?))
}

/// POST /api/v1/interviews/:id/skip
pub async fn handle_skip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session::answer(&state, id, CandidateReply::Skip).await?))
}

/// POST /api/v1/interviews/:id/end
///
/// The body is optional; without one the interview is ended manually.
pub async fn handle_end(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    req: Option<Json<EndInterviewRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let early = EarlyEnd {
        auto_ended: req.auto_ended,
        reason: req.reason.filter(|r| !r.trim().is_empty()),
    };
    Ok(Json(session::end(&state, id, early).await?))
}
