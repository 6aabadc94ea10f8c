use lesson_core::model::{ModuleId, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, map_submission_row, ser};
use crate::repository::{StorageError, SubmissionRecord, SubmissionRepository};

#[async_trait::async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn save_submission(&self, record: &SubmissionRecord) -> Result<i64, StorageError> {
        let answers = serde_json::to_string(&record.answers).map_err(ser)?;
        let result = record
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO submissions (
                student_id, module_id, section_id, section_title, section_type,
                answers, submitted_at, result, time_spent_seconds, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(record.student_id.as_str())
        .bind(record.module_id.as_str())
        .bind(record.section_id.as_str())
        .bind(record.section_title.as_str())
        .bind(record.section_type.as_str())
        .bind(answers)
        .bind(record.submitted_at)
        .bind(result)
        .bind(i64::from(record.time_spent_seconds))
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_submissions(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Vec<SubmissionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, module_id, section_id, section_title, section_type,
                   answers, submitted_at, result, time_spent_seconds, status
            FROM submissions
            WHERE student_id = ?1 AND module_id = ?2
            ORDER BY id ASC
            ",
        )
        .bind(student_id.as_str())
        .bind(module_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_submission_row).collect()
    }
}
