use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::interview::state::Evaluation;
use crate::report::recommendation::Recommendation;

pub const STATUS_SCREENED: &str = "screened";
pub const STATUS_COMPLETED: &str = "completed";

/// One row of the `candidates` table. JSON columns are kept as the raw text
/// the database holds; the accessors below decode them leniently.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub resume_score: Option<i64>,
    pub resume_analysis: Option<String>,
    pub extracted_topics: Option<String>,
    pub question_bank: Option<String>,
    pub interview_data: Option<String>,
    pub interview_score: Option<f64>,
    pub status: Option<String>,
    pub final_summary: Option<String>,
    pub can_hire: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl CandidateRow {
    pub fn resume_score(&self) -> i64 {
        self.resume_score.unwrap_or(0)
    }

    pub fn is_screened(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SCREENED)
    }

    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETED)
    }

    pub fn topics(&self) -> Vec<String> {
        string_list(self.extracted_topics.as_deref())
    }

    pub fn question_bank(&self) -> Vec<String> {
        string_list(self.question_bank.as_deref())
    }

    /// Stored screening analysis, or `Value::Null` when absent or malformed.
    pub fn analysis(&self) -> Value {
        self.resume_analysis
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null)
    }

    pub fn years_of_experience(&self) -> f64 {
        let years = match &self.analysis()["years_of_experience"] {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        years.max(0.0)
    }

    /// Graded questions; entries that cannot be read are dropped.
    pub fn evaluations(&self) -> Vec<Evaluation> {
        let Some(raw) = self.interview_data.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Value>>(raw) {
            Ok(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.final_summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Recommendation::from_stored(s, self.can_hire.as_deref()))
    }
}

fn string_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|raw| serde_json::from_str::<Vec<Value>>(raw).ok())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A screened candidate with nothing else filled in.
    pub fn candidate(name: &str, resume_score: i64) -> CandidateRow {
        CandidateRow {
            id: 1,
            name: name.to_string(),
            email: None,
            resume_score: Some(resume_score),
            resume_analysis: None,
            extracted_topics: None,
            question_bank: None,
            interview_data: None,
            interview_score: None,
            status: Some(STATUS_SCREENED.to_string()),
            final_summary: None,
            can_hire: None,
            timestamp: None,
        }
    }
}
