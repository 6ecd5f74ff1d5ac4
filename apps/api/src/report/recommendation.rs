//! HR recommendation: threshold-based decision plus an LLM-written narrative.
//!
//! The decision and performance band are always derived from the scores so
//! that the model cannot wave every candidate through. The model only fills
//! in the qualitative fields; if it fails, those fall back to "Unknown".

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{InterviewSettings, LlmSettings};
use crate::interview::state::Evaluation;
use crate::llm_client::prompts::{fill, JSON_ONLY_SYSTEM};
use crate::llm_client::{extract_json, CompletionRequest, LanguageModel, LlmError};
use crate::report::prompts::HR_RECOMMENDATION;

pub const UNKNOWN: &str = "Unknown";
pub const NO_SUMMARY: &str = "No summary available.";
pub const DEFAULT_AUTO_END_REASON: &str = "Tab switch limit reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Move Forward")]
    MoveForward,
    Hold,
    Reject,
    /// No decision recorded yet.
    Pending,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::MoveForward => "Move Forward",
            Decision::Hold => "Hold",
            Decision::Reject => "Reject",
            Decision::Pending => "Pending",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "move forward" => Some(Decision::MoveForward),
            "hold" => Some(Decision::Hold),
            "reject" => Some(Decision::Reject),
            "pending" => Some(Decision::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
    Strong,
    Average,
    Weak,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

impl Performance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Performance::Strong => "Strong",
            Performance::Average => "Average",
            Performance::Weak => "Weak",
            Performance::NotEligible => "Not Eligible",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Performance::Strong => {
                "Strong performance based on scores; recommended to move forward."
            }
            Performance::Average => {
                "Average performance; consider for hold or follow-up evaluation."
            }
            Performance::Weak => {
                "Weak performance based on scores; not recommended to move forward."
            }
            Performance::NotEligible => "Not eligible based on resume threshold.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub min_eligible_resume_score: i64,
    pub move_forward: f64,
    pub hold: f64,
}

impl From<&InterviewSettings> for Thresholds {
    fn from(settings: &InterviewSettings) -> Self {
        Self {
            min_eligible_resume_score: settings.min_eligible_resume_score,
            move_forward: settings.move_forward_score,
            hold: settings.hold_score,
        }
    }
}

/// Resume eligibility first, then the interview average against the bands.
pub fn score_decision(
    avg_score: f64,
    resume_score: i64,
    thresholds: &Thresholds,
) -> (Decision, Performance) {
    if resume_score < thresholds.min_eligible_resume_score {
        (Decision::Reject, Performance::NotEligible)
    } else if avg_score >= thresholds.move_forward {
        (Decision::MoveForward, Performance::Strong)
    } else if avg_score >= thresholds.hold {
        (Decision::Hold, Performance::Average)
    } else {
        (Decision::Reject, Performance::Weak)
    }
}

/// Stored as JSON in `candidates.final_summary`. Fields default so partial
/// records written by older builds still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub decision: Decision,
    pub performance: Option<Performance>,
    pub score_based_summary: String,
    pub knowledge_level: String,
    pub role_fit: String,
    pub readiness: String,
    pub summary: String,
    pub concerns: Vec<String>,
    pub auto_ended: bool,
    pub auto_end_reason: Option<String>,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            decision: Decision::Pending,
            performance: None,
            score_based_summary: String::new(),
            knowledge_level: UNKNOWN.to_string(),
            role_fit: UNKNOWN.to_string(),
            readiness: UNKNOWN.to_string(),
            summary: NO_SUMMARY.to_string(),
            concerns: Vec::new(),
            auto_ended: false,
            auto_end_reason: None,
        }
    }
}

impl Recommendation {
    /// Decodes a stored `final_summary`. Plain text written by hand is kept
    /// as the summary, with the decision taken from `can_hire` when readable.
    pub fn from_stored(final_summary: &str, can_hire: Option<&str>) -> Self {
        serde_json::from_str(final_summary).unwrap_or_else(|_| Recommendation {
            decision: can_hire
                .and_then(Decision::parse)
                .unwrap_or(Decision::Pending),
            summary: final_summary.to_string(),
            ..Recommendation::default()
        })
    }

    pub fn mark_auto_ended(&mut self, reason: Option<String>) {
        self.auto_ended = true;
        self.auto_end_reason = Some(reason.unwrap_or_else(|| DEFAULT_AUTO_END_REASON.to_string()));
    }
}

/// What the model is asked to return. Its own `decision` is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelAssessment {
    knowledge_level: Option<String>,
    role_fit: Option<String>,
    readiness: Option<String>,
    summary: Option<String>,
    concerns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub thresholds: Thresholds,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl RecommendationSettings {
    pub fn new(interview: &InterviewSettings, llm: &LlmSettings) -> Self {
        Self {
            thresholds: Thresholds::from(interview),
            temperature: llm.temperature_recommend,
            max_tokens: llm.max_tokens_recommend,
        }
    }
}

/// Builds a recommendation for a finished (or abandoned) interview.
/// Never fails: model errors degrade to the score-only recommendation.
pub async fn generate_recommendation(
    llm: &dyn LanguageModel,
    evaluations: &[Evaluation],
    avg_score: f64,
    resume_score: i64,
    settings: &RecommendationSettings,
) -> Recommendation {
    let assessment = match request_assessment(llm, evaluations, avg_score, resume_score, settings)
        .await
    {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("Recommendation narrative unavailable, using score-only result: {e}");
            ModelAssessment::default()
        }
    };

    let (decision, performance) = score_decision(avg_score, resume_score, &settings.thresholds);
    info!(
        "Recommendation: decision={} performance={} avg={avg_score:.1} resume={resume_score}",
        decision.as_str(),
        performance.as_str()
    );

    let non_blank = |value: Option<String>, fallback: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    Recommendation {
        decision,
        performance: Some(performance),
        score_based_summary: performance.summary().to_string(),
        knowledge_level: non_blank(assessment.knowledge_level, UNKNOWN),
        role_fit: non_blank(assessment.role_fit, UNKNOWN),
        readiness: non_blank(assessment.readiness, UNKNOWN),
        summary: non_blank(assessment.summary, NO_SUMMARY),
        concerns: assessment.concerns,
        auto_ended: false,
        auto_end_reason: None,
    }
}

async fn request_assessment(
    llm: &dyn LanguageModel,
    evaluations: &[Evaluation],
    avg_score: f64,
    resume_score: i64,
    settings: &RecommendationSettings,
) -> Result<ModelAssessment, LlmError> {
    let interview_data = serde_json::to_string(evaluations)?;
    let prompt = fill(
        HR_RECOMMENDATION,
        &[
            ("avg_score", &format!("{avg_score:.2}")),
            ("resume_score", &resume_score.to_string()),
            ("interview_data", &interview_data),
        ],
    );
    let request = CompletionRequest::new(&prompt, settings.temperature, settings.max_tokens)
        .with_system(JSON_ONLY_SYSTEM);
    let raw = llm.complete(request).await?;
    extract_json(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    fn settings() -> RecommendationSettings {
        RecommendationSettings::new(&InterviewSettings::default(), &LlmSettings::default())
    }

    #[test]
    fn test_low_resume_score_is_never_eligible() {
        let thresholds = Thresholds::from(&InterviewSettings::default());
        assert_eq!(
            score_decision(9.5, 69, &thresholds),
            (Decision::Reject, Performance::NotEligible)
        );
    }

    #[test]
    fn test_score_bands() {
        let thresholds = Thresholds::from(&InterviewSettings::default());
        assert_eq!(
            score_decision(6.0, 70, &thresholds),
            (Decision::MoveForward, Performance::Strong)
        );
        assert_eq!(
            score_decision(5.9, 90, &thresholds),
            (Decision::Hold, Performance::Average)
        );
        assert_eq!(
            score_decision(3.5, 90, &thresholds),
            (Decision::Hold, Performance::Average)
        );
        assert_eq!(
            score_decision(3.4, 90, &thresholds),
            (Decision::Reject, Performance::Weak)
        );
    }

    #[test]
    fn test_decision_serializes_with_spaces() {
        let json = serde_json::to_string(&Decision::MoveForward).unwrap();
        assert_eq!(json, r#""Move Forward""#);
        let perf = serde_json::to_string(&Performance::NotEligible).unwrap();
        assert_eq!(perf, r#""Not Eligible""#);
        assert_eq!(Decision::parse(" move FORWARD "), Some(Decision::MoveForward));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[tokio::test]
    async fn test_model_cannot_override_score_decision() {
        let llm = ScriptedModel::new([r#"{
            "decision": "Move Forward",
            "knowledge_level": "Senior",
            "role_fit": "High",
            "readiness": "High",
            "summary": "Impressive depth.",
            "concerns": ["Limited Kafka exposure"]
        }"#]);

        let rec = generate_recommendation(&llm, &[], 2.0, 85, &settings()).await;

        assert_eq!(rec.decision, Decision::Reject);
        assert_eq!(rec.performance, Some(Performance::Weak));
        assert_eq!(rec.knowledge_level, "Senior");
        assert_eq!(rec.summary, "Impressive depth.");
        assert_eq!(rec.concerns, vec!["Limited Kafka exposure".to_string()]);
        assert_eq!(rec.score_based_summary, Performance::Weak.summary());
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_unknown_fields() {
        let llm = ScriptedModel::default();
        llm.push_failure(502);

        let rec = generate_recommendation(&llm, &[], 7.0, 80, &settings()).await;

        assert_eq!(rec.decision, Decision::MoveForward);
        assert_eq!(rec.knowledge_level, UNKNOWN);
        assert_eq!(rec.role_fit, UNKNOWN);
        assert_eq!(rec.summary, NO_SUMMARY);
        assert!(rec.concerns.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_scores_and_evaluations() {
        let llm = ScriptedModel::new(["{}"]);
        let evals = vec![Evaluation {
            question: "What is a mutex?".to_string(),
            score: 7,
            ..Evaluation::default()
        }];

        let rec = generate_recommendation(&llm, &evals, 0.7, 75, &settings()).await;

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("(0-10): 0.70"));
        assert!(prompt.contains("(0-100): 75"));
        assert!(prompt.contains("What is a mutex?"));
        assert_eq!(rec.summary, NO_SUMMARY);
    }

    #[test]
    fn test_from_stored_reads_json_and_plain_text() {
        let stored = serde_json::to_string(&Recommendation {
            decision: Decision::Hold,
            ..Recommendation::default()
        })
        .unwrap();
        assert_eq!(Recommendation::from_stored(&stored, None).decision, Decision::Hold);

        let legacy = Recommendation::from_stored("Good communicator.", Some("Reject"));
        assert_eq!(legacy.decision, Decision::Reject);
        assert_eq!(legacy.summary, "Good communicator.");
    }

    #[test]
    fn test_mark_auto_ended_uses_default_reason() {
        let mut rec = Recommendation::default();
        rec.mark_auto_ended(None);
        assert!(rec.auto_ended);
        assert_eq!(rec.auto_end_reason.as_deref(), Some(DEFAULT_AUTO_END_REASON));
    }
}
