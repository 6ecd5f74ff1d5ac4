use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::candidates::store::{
    clear_candidates, get_candidate, list_candidates, update_recommendation,
};
use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::report::recommendation::{
    generate_recommendation, Recommendation, RecommendationSettings,
};
use crate::report::summary::{
    build_report, fair_average, render_markdown, summarize, CandidateSummary, InterviewReport,
    ReportSettings,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: u64,
}

async fn find_candidate(state: &AppState, name: &str) -> Result<CandidateRow, AppError> {
    get_candidate(&state.db, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate '{name}'")))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    let settings = ReportSettings::from(&state.config.interview);
    let rows = list_candidates(&state.db).await?;
    Ok(Json(rows.iter().map(|row| summarize(row, settings)).collect()))
}

/// DELETE /api/v1/candidates
pub async fn handle_clear_candidates(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, AppError> {
    let removed = clear_candidates(&state.db).await?;
    Ok(Json(ClearResponse { removed }))
}

/// GET /api/v1/candidates/:name
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CandidateRow>, AppError> {
    Ok(Json(find_candidate(&state, &name).await?))
}

/// GET /api/v1/candidates/:name/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<InterviewReport>, AppError> {
    let row = find_candidate(&state, &name).await?;
    Ok(Json(build_report(
        &row,
        ReportSettings::from(&state.config.interview),
    )))
}

/// GET /api/v1/candidates/:name/report/markdown
pub async fn handle_get_markdown_report(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let row = find_candidate(&state, &name).await?;
    let report = build_report(&row, ReportSettings::from(&state.config.interview));
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&report),
    ))
}

/// POST /api/v1/candidates/:name/recommendation
///
/// Re-runs the recommendation over the stored evaluations. An earlier
/// auto-end flag is carried over.
pub async fn handle_regenerate_recommendation(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Recommendation>, AppError> {
    let row = find_candidate(&state, &name).await?;
    let evaluations = row.evaluations();
    if !row.is_completed() && evaluations.is_empty() {
        return Err(AppError::Validation(format!(
            "Candidate '{}' has no interview to assess",
            row.name
        )));
    }

    let avg_score = fair_average(&evaluations, state.config.interview.max_questions);
    let settings = RecommendationSettings::new(&state.config.interview, &state.config.llm);
    let mut recommendation = generate_recommendation(
        state.llm.as_ref(),
        &evaluations,
        avg_score,
        row.resume_score(),
        &settings,
    )
    .await;
    if let Some(previous) = row.recommendation().filter(|r| r.auto_ended) {
        recommendation.mark_auto_ended(previous.auto_end_reason);
    }

    update_recommendation(&state.db, &row.name, &recommendation).await?;
    info!(
        "Recommendation regenerated for '{}': {}",
        row.name,
        recommendation.decision.as_str()
    );
    Ok(Json(recommendation))
}
