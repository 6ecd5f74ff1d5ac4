use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::interview::state::InterviewState;
use crate::models::session::{SessionRow, SESSION_ACTIVE};

/// Opens a new active session. Returns `None` when the candidate already has
/// one, leaving that session untouched.
pub async fn insert_session(
    pool: &SqlitePool,
    candidate_name: &str,
    state: &InterviewState,
    question_started_at: Option<DateTime<Utc>>,
) -> Result<Option<SessionRow>> {
    let now = Utc::now();
    let row = SessionRow {
        id: Uuid::new_v4(),
        candidate_name: candidate_name.to_string(),
        state: Json(state.clone()),
        status: SESSION_ACTIVE.to_string(),
        question_started_at,
        version: 0,
        created_at: now,
        updated_at: now,
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO interview_sessions
            (id, candidate_name, state, status, question_started_at, version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(row.id)
    .bind(&row.candidate_name)
    .bind(&row.state)
    .bind(&row.status)
    .bind(row.question_started_at)
    .bind(row.version)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => Ok(Some(row)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_session(pool: &SqlitePool, id: Uuid) -> Result<Option<SessionRow>> {
    Ok(
        sqlx::query_as::<_, SessionRow>("SELECT * FROM interview_sessions WHERE id = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// The candidate's unfinished session, if any.
pub async fn find_active_session(pool: &SqlitePool, candidate_name: &str) -> Result<Option<SessionRow>> {
    Ok(sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT * FROM interview_sessions
        WHERE candidate_name = ?1 AND status = ?2
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(candidate_name)
    .bind(SESSION_ACTIVE)
    .fetch_optional(pool)
    .await?)
}

/// Writes `session` back if nobody else has since. Returns `false` when the
/// stored version moved on, leaving the row untouched.
pub async fn save_session<'e, E>(executor: E, session: &mut SessionRow) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let updated_at = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE interview_sessions
        SET state = ?1, status = ?2, question_started_at = ?3, version = version + 1, updated_at = ?4
        WHERE id = ?5 AND version = ?6
        "#,
    )
    .bind(&session.state)
    .bind(&session.status)
    .bind(session.question_started_at)
    .bind(updated_at)
    .bind(session.id)
    .bind(session.version)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }
    session.version += 1;
    session.updated_at = updated_at;
    Ok(true)
}
