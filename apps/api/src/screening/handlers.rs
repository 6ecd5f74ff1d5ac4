use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::candidates::store::{upsert_candidate, NewCandidate};
use crate::errors::AppError;
use crate::screening::question_bank::{dedup_questions, parse_question_bank};
use crate::screening::resume::{extract_pdf_text, screen_resume, ScreeningResult, ScreeningSettings};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScreenedCandidate {
    pub name: String,
    pub email: Option<String>,
    pub resume_score: i64,
    pub years_of_experience: f64,
    /// Whether the resume score clears the interview login threshold.
    pub eligible: bool,
    pub topics: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<ScreenedCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchScreeningResponse {
    pub screened: usize,
    pub failed: usize,
    pub question_bank_size: usize,
    pub results: Vec<FileOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct TextScreeningRequest {
    pub jd_text: String,
    pub resume_text: String,
    #[serde(default)]
    pub question_bank: Vec<String>,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}

/// POST /api/v1/screenings
///
/// Multipart fields: `jd_text`, `resumes` (one per PDF), optional
/// `question_bank` (.txt or .csv). A failing resume is reported in its own
/// entry; the rest of the batch still runs.
pub async fn handle_screen_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchScreeningResponse>, AppError> {
    let mut jd_text = String::new();
    let mut resumes: Vec<(String, Bytes)> = Vec::new();
    let mut question_bank = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "jd_text" => jd_text = field.text().await.map_err(bad_multipart)?,
            "resumes" => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                resumes.push((file_name, data));
            }
            "question_bank" => {
                let file_name = field.file_name().unwrap_or("questions.txt").to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                question_bank = parse_question_bank(&file_name, &String::from_utf8_lossy(&data));
                info!("Loaded {} bank questions from '{file_name}'", question_bank.len());
            }
            other => debug!("Ignoring multipart field '{other}'"),
        }
    }

    if jd_text.trim().is_empty() || resumes.is_empty() {
        return Err(AppError::Validation(
            "Please provide a job description and at least one resume".to_string(),
        ));
    }

    info!("Screening {} resumes", resumes.len());
    let today = Utc::now().date_naive();
    let mut results = Vec::with_capacity(resumes.len());
    for (file_name, data) in resumes {
        let outcome = match screen_pdf(&state, data, &jd_text, &question_bank, today).await {
            Ok(candidate) => FileOutcome {
                file_name,
                candidate: Some(candidate),
                error: None,
            },
            Err(e) => {
                warn!("Screening failed for '{file_name}': {e}");
                FileOutcome {
                    file_name,
                    candidate: None,
                    error: Some(e),
                }
            }
        };
        results.push(outcome);
    }

    let screened = results.iter().filter(|r| r.candidate.is_some()).count();
    Ok(Json(BatchScreeningResponse {
        screened,
        failed: results.len() - screened,
        question_bank_size: question_bank.len(),
        results,
    }))
}

/// POST /api/v1/screenings/text
pub async fn handle_screen_text(
    State(state): State<AppState>,
    Json(req): Json<TextScreeningRequest>,
) -> Result<Json<ScreenedCandidate>, AppError> {
    if req.jd_text.trim().is_empty() || req.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "jd_text and resume_text must not be empty".to_string(),
        ));
    }

    let question_bank = dedup_questions(&req.question_bank);
    let result = screen_resume(
        state.llm.as_ref(),
        &req.resume_text,
        &req.jd_text,
        Utc::now().date_naive(),
        ScreeningSettings::from(&state.config.llm),
    )
    .await
    .map_err(|e| AppError::Llm(format!("Resume screening failed: {e}")))?;

    Ok(Json(save_screening(&state, result, question_bank).await?))
}

/// Extract, screen and save one uploaded PDF. Errors come back as the
/// message reported for that file.
async fn screen_pdf(
    state: &AppState,
    data: Bytes,
    jd_text: &str,
    question_bank: &[String],
    today: NaiveDate,
) -> Result<ScreenedCandidate, String> {
    let resume_text = tokio::task::spawn_blocking(move || extract_pdf_text(&data))
        .await
        .map_err(|e| format!("PDF parser crashed: {e}"))?
        .map_err(|e| e.to_string())?;

    let result = screen_resume(
        state.llm.as_ref(),
        &resume_text,
        jd_text,
        today,
        ScreeningSettings::from(&state.config.llm),
    )
    .await
    .map_err(|e| format!("Resume screening failed: {e}"))?;

    save_screening(state, result, question_bank.to_vec())
        .await
        .map_err(|e| e.to_string())
}

async fn save_screening(
    state: &AppState,
    result: ScreeningResult,
    question_bank: Vec<String>,
) -> Result<ScreenedCandidate, AppError> {
    let analysis = serde_json::to_value(&result).map_err(anyhow::Error::from)?;
    let row = upsert_candidate(
        &state.db,
        &NewCandidate {
            name: result.name.clone(),
            email: result.email.clone(),
            resume_score: result.score,
            resume_analysis: analysis,
            extracted_topics: result.extracted_topics.clone(),
            question_bank,
        },
    )
    .await?;

    Ok(ScreenedCandidate {
        eligible: row.resume_score() >= state.config.interview.min_eligible_resume_score,
        name: row.name,
        email: result.email,
        resume_score: result.score,
        years_of_experience: result.years_of_experience,
        topics: result.extracted_topics,
        reasoning: result.reasoning,
    })
}
