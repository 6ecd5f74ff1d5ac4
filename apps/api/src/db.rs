use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const CREATE_CANDIDATES: &str = r#"
CREATE TABLE IF NOT EXISTS candidates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    email TEXT,
    resume_score INTEGER,
    resume_analysis TEXT,
    extracted_topics TEXT,
    question_bank TEXT,
    interview_data TEXT,
    interview_score REAL,
    status TEXT,
    final_summary TEXT DEFAULT NULL,
    can_hire TEXT DEFAULT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Columns added after the first release. Databases created by older builds
/// are upgraded in place at startup.
const CANDIDATE_COLUMN_MIGRATIONS: [(&str, &str); 3] = [
    (
        "final_summary",
        "ALTER TABLE candidates ADD COLUMN final_summary TEXT DEFAULT NULL",
    ),
    (
        "can_hire",
        "ALTER TABLE candidates ADD COLUMN can_hire TEXT DEFAULT NULL",
    ),
    (
        "question_bank",
        "ALTER TABLE candidates ADD COLUMN question_bank TEXT DEFAULT NULL",
    ),
];

const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS interview_sessions (
    id BLOB PRIMARY KEY,
    candidate_name TEXT NOT NULL,
    state TEXT NOT NULL,
    status TEXT NOT NULL,
    question_started_at TEXT,
    version INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// At most one active session per candidate. Concurrent logins race on this
/// index rather than on a read-then-insert.
const CREATE_SESSIONS_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active \
     ON interview_sessions (candidate_name) WHERE status = 'active'";

/// Older builds could leave several active sessions per candidate; only the
/// newest survives, or the unique index cannot be built.
const CLOSE_DUPLICATE_SESSIONS: &str = r#"
UPDATE interview_sessions SET status = 'completed'
WHERE status = 'active' AND id NOT IN (
    SELECT id FROM interview_sessions AS newest
    WHERE newest.status = 'active'
      AND newest.candidate_name = interview_sessions.candidate_name
    ORDER BY newest.created_at DESC
    LIMIT 1
)
"#;

/// Opens (creating if needed) the SQLite database and returns a connection pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database at {database_url}");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates missing tables and adds columns that older databases lack.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_CANDIDATES).execute(pool).await?;

    for (column, ddl) in CANDIDATE_COLUMN_MIGRATIONS {
        if !column_exists(pool, "candidates", column).await? {
            info!("Migrating DB: adding {column} column");
            sqlx::query(ddl).execute(pool).await?;
        }
    }

    sqlx::query(CREATE_SESSIONS).execute(pool).await?;
    sqlx::query("DROP INDEX IF EXISTS idx_sessions_candidate")
        .execute(pool)
        .await?;
    let closed = sqlx::query(CLOSE_DUPLICATE_SESSIONS)
        .execute(pool)
        .await?
        .rows_affected();
    if closed > 0 {
        info!("Migrating DB: closed {closed} duplicate active sessions");
    }
    sqlx::query(CREATE_SESSIONS_INDEX).execute(pool).await?;

    Ok(())
}

async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(pool)
        .await?;
    Ok(columns.iter().any(|c| c == column))
}


#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_CANDIDATES: &str = r#"
        CREATE TABLE candidates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE,
            email TEXT,
            resume_score INTEGER,
            resume_analysis TEXT,
            extracted_topics TEXT,
            interview_data TEXT,
            interview_score REAL,
            status TEXT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        )
    "#;

    #[tokio::test]
    async fn test_migrations_upgrade_legacy_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(LEGACY_CANDIDATES).execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO candidates (name, resume_score, status) VALUES ('ada', 80, 'screened')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        for column in ["final_summary", "can_hire", "question_bank"] {
            assert!(column_exists(&pool, "candidates", column).await.unwrap());
        }
        let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = testing::memory_pool().await;
        run_migrations(&pool).await.unwrap();
        assert!(column_exists(&pool, "interview_sessions", "state").await.unwrap());
    }

    #[tokio::test]
    async fn test_second_active_session_is_rejected() {
        let pool = testing::memory_pool().await;
        let insert = "INSERT INTO interview_sessions \
             (id, candidate_name, state, status, version, created_at, updated_at) \
             VALUES (?1, 'ada', '{}', ?2, 0, '2024-01-01', '2024-01-01')";

        for status in ["completed", "completed", "active"] {
            sqlx::query(insert)
                .bind(uuid::Uuid::new_v4())
                .bind(status)
                .execute(&pool)
                .await
                .unwrap();
        }
        let err = sqlx::query(insert)
            .bind(uuid::Uuid::new_v4())
            .bind("active")
            .execute(&pool)
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(e) => assert!(e.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_migrations_close_duplicate_active_sessions() {
        let pool = testing::memory_pool().await;
        sqlx::query("DROP INDEX idx_sessions_one_active")
            .execute(&pool)
            .await
            .unwrap();
        for created_at in ["2024-01-01", "2024-01-02"] {
            sqlx::query(
                "INSERT INTO interview_sessions \
                 (id, candidate_name, state, status, version, created_at, updated_at) \
                 VALUES (?1, 'ada', '{}', 'active', 0, ?2, ?2)",
            )
            .bind(uuid::Uuid::new_v4())
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
        }

        run_migrations(&pool).await.unwrap();

        let active: Vec<String> = sqlx::query_scalar(
            "SELECT created_at FROM interview_sessions WHERE status = 'active'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(active, vec!["2024-01-02".to_string()]);
    }

    #[tokio::test]
    async fn test_create_pool_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.db");
        let url = format!("sqlite://{}", path.display());

        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }
}
