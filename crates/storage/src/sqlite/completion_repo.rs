use lesson_core::model::{CompletionRecord, ModuleId, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, map_completion_row};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn save_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO completions (
                student_id, module_id, final_score, time_spent_minutes,
                pre_test_score, post_test_score, sections_completed,
                total_sections, perfect_sections, badge_tier, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(record.student_id.as_str())
        .bind(record.module_id.as_str())
        .bind(record.final_score)
        .bind(i64::from(record.time_spent_minutes))
        .bind(record.pre_test_score)
        .bind(record.post_test_score)
        .bind(i64::from(record.sections_completed))
        .bind(i64::from(record.total_sections))
        .bind(i64::from(record.perfect_sections))
        .bind(record.badge_tier.as_str())
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_completion(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Option<CompletionRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_id, module_id, final_score, time_spent_minutes,
                   pre_test_score, post_test_score, sections_completed,
                   total_sections, perfect_sections, badge_tier, completed_at
            FROM completions
            WHERE student_id = ?1 AND module_id = ?2
            ORDER BY completed_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(student_id.as_str())
        .bind(module_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_completion_row).transpose()
    }
}
