//! Interview state carried between graph runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Topic used when screening extracted none.
pub const DEFAULT_TOPIC: &str = "General Technical";

/// History marker for a question the candidate chose to skip.
pub const SKIP_MARKER: &str = "<SKIPPED>";

pub const MIN_COMPLEXITY: u8 = 1;
pub const MAX_COMPLEXITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn skipped() -> Self {
        Self::user(SKIP_MARKER)
    }

    pub fn is_skip(&self) -> bool {
        self.role == Role::User && self.content == SKIP_MARKER
    }
}

/// The candidate's reply to the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateReply {
    Answer(String),
    Skip,
}

impl CandidateReply {
    pub fn into_turn(self) -> ChatTurn {
        match self {
            CandidateReply::Answer(text) => ChatTurn::user(text),
            CandidateReply::Skip => ChatTurn::skipped(),
        }
    }
}

/// One graded question. Every field defaults so that records written by older
/// builds (no `skipped`, no `duration_secs`) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluation {
    pub question: String,
    pub user_answer: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
    pub feedback: String,
    pub topics: Vec<String>,
    pub complexity: u8,
    pub skipped: bool,
    /// Seconds between the question being shown and the answer arriving.
    #[serde(alias = "duration")]
    pub duration_secs: Option<f64>,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            question: String::new(),
            user_answer: String::new(),
            score: 0,
            feedback: String::new(),
            topics: Vec::new(),
            complexity: MIN_COMPLEXITY,
            skipped: false,
            duration_secs: None,
        }
    }
}

impl Evaluation {
    /// Skipped either explicitly, or (older records) a zero score whose
    /// feedback mentions the skip.
    pub fn was_skipped(&self) -> bool {
        self.skipped || (self.score == 0 && self.feedback.to_lowercase().contains("skipped"))
    }
}

/// Reads a model- or legacy-supplied score: numbers and numeric strings are
/// rounded and clamped into `0..=max`; anything else is 0.
pub fn score_from_value(value: &Value, max: u8) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, f64::from(max)) as u8,
        _ => 0,
    }
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value, 10))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub topics: Vec<String>,
    pub history: Vec<ChatTurn>,
    pub current_question: Option<String>,
    pub evaluations: Vec<Evaluation>,
    /// 1 (basic) to 10 (expert); raised after every evaluation.
    pub complexity_level: u8,
    /// Number of questions evaluated so far.
    pub question_count: u32,
    /// Remaining HR-supplied questions; drawn questions are removed.
    pub question_bank: Vec<String>,
    /// Number of questions drawn from the bank.
    pub bank_index: u32,
    #[serde(default)]
    pub years_of_experience: f64,
}

impl InterviewState {
    pub fn new(topics: Vec<String>, question_bank: Vec<String>, years_of_experience: f64) -> Self {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let topics = if topics.is_empty() {
            vec![DEFAULT_TOPIC.to_string()]
        } else {
            topics
        };

        Self {
            topics,
            history: Vec::new(),
            current_question: None,
            evaluations: Vec::new(),
            complexity_level: MIN_COMPLEXITY,
            question_count: 0,
            question_bank,
            bank_index: 0,
            years_of_experience: years_of_experience.max(0.0),
        }
    }

    pub fn last_turn(&self) -> Option<&ChatTurn> {
        self.history.last()
    }

    /// True when the candidate spoke last and the answer has not been graded.
    pub fn awaiting_evaluation(&self) -> bool {
        matches!(self.last_turn(), Some(turn) if turn.role == Role::User)
    }

    /// History rendered one `role: content` line per turn.
    pub fn formatted_history(&self) -> String {
        self.history
            .iter()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Questions the assistant has already put to the candidate.
    pub fn asked_questions(&self) -> impl Iterator<Item = &str> {
        self.history
            .iter()
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str())
    }
}
