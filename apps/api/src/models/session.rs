use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::interview::state::InterviewState;

pub const SESSION_ACTIVE: &str = "active";
pub const SESSION_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub candidate_name: String,
    pub state: Json<InterviewState>,
    pub status: String,
    /// When the current question was shown; `None` once the interview ends.
    pub question_started_at: Option<DateTime<Utc>>,
    /// Bumped on every write; guards against two replies racing.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRow {
    pub fn is_active(&self) -> bool {
        self.status == SESSION_ACTIVE
    }
}
