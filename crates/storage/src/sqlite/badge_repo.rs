use lesson_core::model::StudentId;

use super::SqliteRepository;
use super::mapping::{conn, map_badge_row};
use crate::repository::{BadgeAward, BadgeRepository, StorageError};

#[async_trait::async_trait]
impl BadgeRepository for SqliteRepository {
    async fn award_badge(&self, award: &BadgeAward) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO badges (
                student_id, module_id, badge_type, name, description,
                icon, rarity, criteria, awarded_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(student_id, module_id, badge_type) DO NOTHING
            ",
        )
        .bind(award.student_id.as_str())
        .bind(award.module_id.as_str())
        .bind(award.badge_type.as_str())
        .bind(award.name.as_str())
        .bind(award.description.as_str())
        .bind(award.icon.as_str())
        .bind(award.rarity.as_str())
        .bind(award.criteria.as_str())
        .bind(award.awarded_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_badges(&self, student_id: &StudentId) -> Result<Vec<BadgeAward>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, module_id, badge_type, name, description,
                   icon, rarity, criteria, awarded_at
            FROM badges
            WHERE student_id = ?1
            ORDER BY awarded_at ASC, id ASC
            ",
        )
        .bind(student_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_badge_row).collect()
    }
}
