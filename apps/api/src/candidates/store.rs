use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::info;

use crate::interview::state::Evaluation;
use crate::models::candidate::{CandidateRow, STATUS_COMPLETED, STATUS_SCREENED};
use crate::report::recommendation::Recommendation;

/// Names are the candidate key; stored trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Screening output for one resume.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub email: Option<String>,
    pub resume_score: i64,
    pub resume_analysis: Value,
    pub extracted_topics: Vec<String>,
    pub question_bank: Vec<String>,
}

/// Inserts or replaces a candidate. Re-screening wipes any previous interview
/// (results and sessions) and puts the candidate back to `screened`.
pub async fn upsert_candidate(pool: &SqlitePool, candidate: &NewCandidate) -> Result<CandidateRow> {
    let name = normalize_name(&candidate.name);
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO candidates
            (name, email, resume_score, resume_analysis, extracted_topics, question_bank,
             interview_data, interview_score, status, final_summary, can_hire, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7, NULL, NULL, CURRENT_TIMESTAMP)
        ON CONFLICT(name) DO UPDATE SET
            email = excluded.email,
            resume_score = excluded.resume_score,
            resume_analysis = excluded.resume_analysis,
            extracted_topics = excluded.extracted_topics,
            question_bank = excluded.question_bank,
            interview_data = NULL,
            interview_score = NULL,
            status = excluded.status,
            final_summary = NULL,
            can_hire = NULL,
            timestamp = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&name)
    .bind(&candidate.email)
    .bind(candidate.resume_score)
    .bind(candidate.resume_analysis.to_string())
    .bind(serde_json::to_string(&candidate.extracted_topics)?)
    .bind(serde_json::to_string(&candidate.question_bank)?)
    .bind(STATUS_SCREENED)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM interview_sessions WHERE candidate_name = ?1")
        .bind(&name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Saved candidate '{name}' (resume score {})", candidate.resume_score);

    get_candidate(pool, &name)
        .await?
        .with_context(|| format!("Candidate '{name}' missing right after upsert"))
}

pub async fn get_candidate(pool: &SqlitePool, name: &str) -> Result<Option<CandidateRow>> {
    Ok(
        sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE name = ?1")
            .bind(normalize_name(name))
            .fetch_optional(pool)
            .await?,
    )
}

/// All candidates, newest first.
pub async fn list_candidates(pool: &SqlitePool) -> Result<Vec<CandidateRow>> {
    Ok(
        sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates ORDER BY timestamp DESC, id DESC")
            .fetch_all(pool)
            .await?,
    )
}

/// Stores a finished interview and marks the candidate `completed`.
///
/// Only a `screened` candidate is updated, so a result is never written over
/// another one. Returns `false` when nothing matched.
pub async fn update_interview_result<'e, E>(
    executor: E,
    name: &str,
    evaluations: &[Evaluation],
    interview_score: f64,
    recommendation: &Recommendation,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE candidates
        SET interview_data = ?1, interview_score = ?2, status = ?3,
            final_summary = ?4, can_hire = ?5
        WHERE name = ?6 AND status = ?7
        "#,
    )
    .bind(serde_json::to_string(evaluations)?)
    .bind(interview_score)
    .bind(STATUS_COMPLETED)
    .bind(serde_json::to_string(recommendation)?)
    .bind(recommendation.decision.as_str())
    .bind(normalize_name(name))
    .bind(STATUS_SCREENED)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }
    info!("Interview result stored for '{name}': score {interview_score:.2}");
    Ok(true)
}

/// Replaces the stored recommendation, leaving the interview data alone.
pub async fn update_recommendation(
    pool: &SqlitePool,
    name: &str,
    recommendation: &Recommendation,
) -> Result<()> {
    let result = sqlx::query("UPDATE candidates SET final_summary = ?1, can_hire = ?2 WHERE name = ?3")
        .bind(serde_json::to_string(recommendation)?)
        .bind(recommendation.decision.as_str())
        .bind(normalize_name(name))
        .execute(pool)
        .await?;

    anyhow::ensure!(result.rows_affected() == 1, "Candidate '{name}' not found");
    Ok(())
}

/// Deletes every candidate and interview session. Returns the number of
/// candidates removed.
pub async fn clear_candidates(pool: &SqlitePool) -> Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM interview_sessions")
        .execute(&mut *tx)
        .await?;
    let removed = sqlx::query("DELETE FROM candidates")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    info!("Cleared {removed} candidates");
    Ok(removed)
}

#[cfg(test)]
pub mod testing {
    use super::*;

    pub fn new_candidate(name: &str, resume_score: i64) -> NewCandidate {
        NewCandidate {
            name: name.to_string(),
            email: Some(format!("{}@example.com", normalize_name(name).replace(' ', "."))),
            resume_score,
            resume_analysis: serde_json::json!({
                "name": name,
                "score": resume_score,
                "years_of_experience": 3,
                "reasoning": "Relevant backend work.",
            }),
            extracted_topics: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            question_bank: Vec::new(),
        }
    }
}
