use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::SqliteInitError;

/// Applies the versioned schema: submissions, completions, badges and their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS submissions (
                    id INTEGER PRIMARY KEY,
                    student_id TEXT NOT NULL,
                    module_id TEXT NOT NULL,
                    section_id TEXT NOT NULL,
                    section_title TEXT NOT NULL,
                    section_type TEXT NOT NULL,
                    answers TEXT NOT NULL,
                    submitted_at TEXT NOT NULL,
                    result TEXT,
                    time_spent_seconds INTEGER NOT NULL CHECK (time_spent_seconds >= 0),
                    status TEXT NOT NULL CHECK (status IN ('draft', 'submitted'))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completions (
                    id INTEGER PRIMARY KEY,
                    student_id TEXT NOT NULL,
                    module_id TEXT NOT NULL,
                    final_score REAL NOT NULL,
                    time_spent_minutes INTEGER NOT NULL CHECK (time_spent_minutes >= 0),
                    pre_test_score REAL,
                    post_test_score REAL,
                    sections_completed INTEGER NOT NULL CHECK (sections_completed >= 0),
                    total_sections INTEGER NOT NULL CHECK (total_sections >= 0),
                    perfect_sections INTEGER NOT NULL CHECK (perfect_sections >= 0),
                    badge_tier TEXT NOT NULL,
                    completed_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS badges (
                    id INTEGER PRIMARY KEY,
                    student_id TEXT NOT NULL,
                    module_id TEXT NOT NULL,
                    badge_type TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    rarity TEXT NOT NULL,
                    criteria TEXT NOT NULL,
                    awarded_at TEXT NOT NULL,
                    UNIQUE (student_id, module_id, badge_type)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_submissions_student_module
                    ON submissions (student_id, module_id, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_completions_student_module
                    ON completions (student_id, module_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(version = 1, "schema migration applied");
    }

    Ok(())
}
