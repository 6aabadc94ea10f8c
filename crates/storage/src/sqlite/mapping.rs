use lesson_core::model::{BadgeTier, CompletionRecord, ContentType, ModuleId, SectionId, StudentId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{BadgeAward, StorageError, SubmissionRecord, SubmissionStatus};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_badge_tier(s: &str) -> Result<BadgeTier, StorageError> {
    BadgeTier::parse(s).ok_or_else(|| StorageError::Serialization(format!("invalid badge tier: {s}")))
}

pub(crate) fn map_submission_row(row: &SqliteRow) -> Result<SubmissionRecord, StorageError> {
    let section_type: String = row.try_get("section_type").map_err(ser)?;
    let section_type = ContentType::parse(&section_type).ok_or_else(|| {
        StorageError::Serialization(format!("invalid section type: {section_type}"))
    })?;

    let status: String = row.try_get("status").map_err(ser)?;
    let status = SubmissionStatus::parse(&status)
        .ok_or_else(|| StorageError::Serialization(format!("invalid status: {status}")))?;

    let answers: String = row.try_get("answers").map_err(ser)?;
    let result: Option<String> = row.try_get("result").map_err(ser)?;

    Ok(SubmissionRecord {
        student_id: StudentId::new(row.try_get::<String, _>("student_id").map_err(ser)?),
        module_id: ModuleId::new(row.try_get::<String, _>("module_id").map_err(ser)?),
        section_id: SectionId::new(row.try_get::<String, _>("section_id").map_err(ser)?),
        section_title: row.try_get("section_title").map_err(ser)?,
        section_type,
        answers: serde_json::from_str(&answers).map_err(ser)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
        result: result
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(ser)?,
        time_spent_seconds: u32_from_i64(
            "time_spent_seconds",
            row.try_get("time_spent_seconds").map_err(ser)?,
        )?,
        status,
    })
}

pub(crate) fn map_completion_row(row: &SqliteRow) -> Result<CompletionRecord, StorageError> {
    let tier: String = row.try_get("badge_tier").map_err(ser)?;
    Ok(CompletionRecord {
        student_id: StudentId::new(row.try_get::<String, _>("student_id").map_err(ser)?),
        module_id: ModuleId::new(row.try_get::<String, _>("module_id").map_err(ser)?),
        final_score: row.try_get("final_score").map_err(ser)?,
        time_spent_minutes: u32_from_i64(
            "time_spent_minutes",
            row.try_get("time_spent_minutes").map_err(ser)?,
        )?,
        pre_test_score: row.try_get("pre_test_score").map_err(ser)?,
        post_test_score: row.try_get("post_test_score").map_err(ser)?,
        sections_completed: u32_from_i64(
            "sections_completed",
            row.try_get("sections_completed").map_err(ser)?,
        )?,
        total_sections: u32_from_i64("total_sections", row.try_get("total_sections").map_err(ser)?)?,
        perfect_sections: u32_from_i64(
            "perfect_sections",
            row.try_get("perfect_sections").map_err(ser)?,
        )?,
        badge_tier: parse_badge_tier(&tier)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_badge_row(row: &SqliteRow) -> Result<BadgeAward, StorageError> {
    let tier: String = row.try_get("badge_type").map_err(ser)?;
    Ok(BadgeAward {
        student_id: StudentId::new(row.try_get::<String, _>("student_id").map_err(ser)?),
        module_id: ModuleId::new(row.try_get::<String, _>("module_id").map_err(ser)?),
        badge_type: parse_badge_tier(&tier)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        icon: row.try_get("icon").map_err(ser)?,
        rarity: row.try_get("rarity").map_err(ser)?,
        criteria: row.try_get("criteria").map_err(ser)?,
        awarded_at: row.try_get("awarded_at").map_err(ser)?,
    })
}
