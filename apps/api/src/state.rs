use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::interview::graph::InterviewGraph;
use crate::llm_client::LanguageModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// `LlmClient` in production.
    pub llm: Arc<dyn LanguageModel>,
    pub config: Config,
    /// Built once from config; stateless between runs.
    pub graph: Arc<InterviewGraph>,
}
