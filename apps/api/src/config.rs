use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a local-development default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: LlmSettings,
    pub interview: InterviewSettings,
    pub port: u16,
    pub rust_log: String,
}

/// Connection and sampling settings for the OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature_ask: f32,
    pub temperature_eval: f32,
    pub temperature_recommend: f32,
    pub max_tokens_question: u32,
    pub max_tokens_eval: u32,
    pub max_tokens_recommend: u32,
}

/// Interview loop and hiring thresholds.
#[derive(Debug, Clone)]
pub struct InterviewSettings {
    pub max_questions: u32,
    /// Every Nth question comes from the uploaded bank. 0 disables the bank.
    pub bank_ask_every: u32,
    pub min_eligible_resume_score: i64,
    pub move_forward_score: f64,
    pub hold_score: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            api_key: "EMPTY".to_string(),
            model: "meta-llama/Meta-Llama-3.1-8B-Instruct".to_string(),
            timeout_secs: 15,
            temperature_ask: 0.7,
            temperature_eval: 0.2,
            temperature_recommend: 0.2,
            max_tokens_question: 220,
            max_tokens_eval: 220,
            max_tokens_recommend: 350,
        }
    }
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            max_questions: 10,
            bank_ask_every: 2,
            min_eligible_resume_score: 70,
            move_forward_score: 6.0,
            hold_score: 3.5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_defaults = LlmSettings::default();
        let interview_defaults = InterviewSettings::default();

        Ok(Config {
            database_url: env_string("DATABASE_URL", "sqlite://candidates.db"),
            llm: LlmSettings {
                base_url: env_string("LLM_BASE_URL", &llm_defaults.base_url),
                api_key: env_string("LLM_API_KEY", &llm_defaults.api_key),
                model: env_string("LLM_MODEL", &llm_defaults.model),
                timeout_secs: env_parse("LLM_TIMEOUT_SECONDS", llm_defaults.timeout_secs)?,
                temperature_ask: env_parse("TEMPERATURE_ASK", llm_defaults.temperature_ask)?,
                temperature_eval: env_parse("TEMPERATURE_EVAL", llm_defaults.temperature_eval)?,
                temperature_recommend: env_parse(
                    "TEMPERATURE_RECOMMEND",
                    llm_defaults.temperature_recommend,
                )?,
                max_tokens_question: env_parse(
                    "MAX_TOKENS_QUESTION",
                    llm_defaults.max_tokens_question,
                )?,
                max_tokens_eval: env_parse("MAX_TOKENS_EVAL", llm_defaults.max_tokens_eval)?,
                max_tokens_recommend: env_parse(
                    "MAX_TOKENS_RECOMMEND",
                    llm_defaults.max_tokens_recommend,
                )?,
            },
            interview: InterviewSettings {
                max_questions: env_parse("MAX_QUESTIONS", interview_defaults.max_questions)?,
                bank_ask_every: env_parse("BANK_ASK_EVERY", interview_defaults.bank_ask_every)?,
                min_eligible_resume_score: env_parse(
                    "MIN_ELIGIBLE_RESUME_SCORE",
                    interview_defaults.min_eligible_resume_score,
                )?,
                move_forward_score: env_parse(
                    "MOVE_FORWARD_SCORE",
                    interview_defaults.move_forward_score,
                )?,
                hold_score: env_parse("HOLD_SCORE", interview_defaults.hold_score)?,
            },
            port: env_parse("PORT", 8080)?,
            rust_log: env_string("RUST_LOG", "info"),
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
