use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LlmSettings;
use crate::interview::state::score_from_value;
use crate::llm_client::prompts::{fill, truncate_chars, JSON_ONLY_SYSTEM};
use crate::llm_client::{extract_json, CompletionRequest, LanguageModel, LlmError};
use crate::screening::prompts::RESUME_SCREENING;

pub const MAX_RESUME_CHARS: usize = 4000;
pub const MAX_JD_CHARS: usize = 2000;
pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("PDF contains no extractable text")]
    Empty,
}

/// Extracts the text of every page, in order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PdfError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfError::Extraction(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(PdfError::Empty);
    }
    Ok(text)
}

#[derive(Debug, Clone, Copy)]
pub struct ScreeningSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmSettings> for ScreeningSettings {
    fn from(llm: &LlmSettings) -> Self {
        Self {
            temperature: llm.temperature_eval,
            max_tokens: llm.max_tokens_eval,
        }
    }
}

/// Normalized screening verdict for one resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub name: String,
    pub email: Option<String>,
    /// 0-100 match against the job description.
    pub score: i64,
    pub years_of_experience: f64,
    pub reasoning: String,
    pub extracted_topics: Vec<String>,
}

/// The model's reply, read leniently.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScreeningReply {
    name: Option<String>,
    email: Option<String>,
    score: Value,
    years_of_experience: Value,
    reasoning: Option<String>,
    extracted_topics: Value,
}

impl ScreeningReply {
    fn normalize(self) -> ScreeningResult {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string());

        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| e.contains('@'));

        let years = match &self.years_of_experience {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };

        let extracted_topics = match self.extracted_topics {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        ScreeningResult {
            name,
            email,
            score: i64::from(score_from_value(&self.score, 100)),
            years_of_experience: if years.is_finite() { years.max(0.0) } else { 0.0 },
            reasoning: self.reasoning.unwrap_or_default(),
            extracted_topics,
        }
    }
}

/// Scores one resume against a job description.
///
/// Inputs are truncated before prompting; `today` resolves open-ended
/// ("Present") employment ranges.
pub async fn screen_resume(
    llm: &dyn LanguageModel,
    resume_text: &str,
    jd_text: &str,
    today: NaiveDate,
    settings: ScreeningSettings,
) -> Result<ScreeningResult, LlmError> {
    let prompt = fill(
        RESUME_SCREENING,
        &[
            ("jd_text", truncate_chars(jd_text, MAX_JD_CHARS)),
            ("resume_text", truncate_chars(resume_text, MAX_RESUME_CHARS)),
            ("current_date", &today.format("%Y-%m-%d").to_string()),
        ],
    );
    debug!("Screening prompt: {} chars", prompt.len());

    let request = CompletionRequest::new(&prompt, settings.temperature, settings.max_tokens)
        .with_system(JSON_ONLY_SYSTEM);
    let raw = llm.complete(request).await?;
    let result = extract_json::<ScreeningReply>(&raw)?.normalize();

    info!(
        "Screened '{}': score {} ({} years, {} topics)",
        result.name,
        result.score,
        result.years_of_experience,
        result.extracted_topics.len()
    );
    Ok(result)
}
