use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{
    AssessmentResult, BadgeTier, CompletionRecord, ContentType, ModuleId, SectionAnswers,
    SectionId, StudentId,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Whether a submission captures in-progress answers or a graded submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
}

impl SubmissionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(SubmissionStatus::Draft),
            "submitted" => Some(SubmissionStatus::Submitted),
            _ => None,
        }
    }
}

/// Persisted shape of one section's answers and (optional) grading.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub student_id: StudentId,
    pub module_id: ModuleId,
    pub section_id: SectionId,
    pub section_title: String,
    pub section_type: ContentType,
    pub answers: SectionAnswers,
    pub submitted_at: DateTime<Utc>,
    pub result: Option<AssessmentResult>,
    pub time_spent_seconds: u32,
    pub status: SubmissionStatus,
}

/// A badge granted to a learner for finishing a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeAward {
    pub student_id: StudentId,
    pub module_id: ModuleId,
    pub badge_type: BadgeTier,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub rarity: String,
    pub criteria: String,
    pub awarded_at: DateTime<Utc>,
}

impl BadgeAward {
    /// Builds the award matching the record's tier.
    #[must_use]
    pub fn for_completion(record: &CompletionRecord, awarded_at: DateTime<Utc>) -> Self {
        let tier = record.badge_tier;
        Self {
            student_id: record.student_id.clone(),
            module_id: record.module_id.clone(),
            badge_type: tier,
            name: tier.display_name().to_owned(),
            description: tier.description().to_owned(),
            icon: tier.icon().to_owned(),
            rarity: tier.rarity().to_owned(),
            criteria: format!("final_score={:.1}", record.final_score),
            awarded_at,
        }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Contract for per-section submission persistence.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Append a submission and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be stored.
    async fn save_submission(&self, record: &SubmissionRecord) -> Result<i64, StorageError>;

    /// List submissions for a learner's module in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_submissions(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Vec<SubmissionRecord>, StorageError>;
}

/// Contract for module completion persistence.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Append a completion record and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError>;

    /// Most recent completion of `module_id` by `student_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn latest_completion(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Option<CompletionRecord>, StorageError>;
}

/// Contract for badge grants. Granting the same tier twice is a no-op.
#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Grant a badge.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the grant cannot be stored.
    async fn award_badge(&self, award: &BadgeAward) -> Result<(), StorageError>;

    /// Badges held by `student_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_badges(&self, student_id: &StudentId) -> Result<Vec<BadgeAward>, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    submissions: Arc<Mutex<Vec<SubmissionRecord>>>,
    completions: Arc<Mutex<Vec<CompletionRecord>>>,
    badges: Arc<Mutex<Vec<BadgeAward>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn row_id(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn save_submission(&self, record: &SubmissionRecord) -> Result<i64, StorageError> {
        let mut guard = self.submissions.lock().map_err(poisoned)?;
        guard.push(record.clone());
        Ok(row_id(guard.len()))
    }

    async fn list_submissions(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Vec<SubmissionRecord>, StorageError> {
        let guard = self.submissions.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|r| &r.student_id == student_id && &r.module_id == module_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn save_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let mut guard = self.completions.lock().map_err(poisoned)?;
        guard.push(record.clone());
        Ok(row_id(guard.len()))
    }

    async fn latest_completion(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Option<CompletionRecord>, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .rev()
            .find(|r| &r.student_id == student_id && &r.module_id == module_id)
            .cloned())
    }
}

#[async_trait]
impl BadgeRepository for InMemoryRepository {
    async fn award_badge(&self, award: &BadgeAward) -> Result<(), StorageError> {
        let mut guard = self.badges.lock().map_err(poisoned)?;
        let exists = guard.iter().any(|b| {
            b.student_id == award.student_id
                && b.module_id == award.module_id
                && b.badge_type == award.badge_type
        });
        if !exists {
            guard.push(award.clone());
        }
        Ok(())
    }

    async fn list_badges(&self, student_id: &StudentId) -> Result<Vec<BadgeAward>, StorageError> {
        let guard = self.badges.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|b| &b.student_id == student_id)
            .cloned()
            .collect())
    }
}

/// Aggregates the collaborator repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub submissions: Arc<dyn SubmissionRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub badges: Arc<dyn BadgeRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            submissions: Arc::new(repo.clone()),
            completions: Arc::new(repo.clone()),
            badges: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::time::fixed_now;

    fn completion(tier: BadgeTier, score: f64) -> CompletionRecord {
        CompletionRecord {
            student_id: StudentId::new("s1"),
            module_id: ModuleId::new("m1"),
            final_score: score,
            time_spent_minutes: 12,
            pre_test_score: None,
            post_test_score: None,
            sections_completed: 3,
            total_sections: 3,
            perfect_sections: 0,
            badge_tier: tier,
            completed_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn latest_completion_returns_most_recent() {
        let repo = InMemoryRepository::new();
        repo.save_completion(&completion(BadgeTier::Bronze, 40.0)).await.unwrap();
        repo.save_completion(&completion(BadgeTier::Gold, 92.0)).await.unwrap();

        let latest = repo
            .latest_completion(&StudentId::new("s1"), &ModuleId::new("m1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.badge_tier, BadgeTier::Gold);
        assert!(
            repo.latest_completion(&StudentId::new("s2"), &ModuleId::new("m1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn awarding_same_tier_twice_is_a_no_op() {
        let repo = InMemoryRepository::new();
        let award = BadgeAward::for_completion(&completion(BadgeTier::Platinum, 100.0), fixed_now());
        repo.award_badge(&award).await.unwrap();
        repo.award_badge(&award).await.unwrap();

        let badges = repo.list_badges(&StudentId::new("s1")).await.unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].name, "Perfect Mastery");
        assert_eq!(badges[0].criteria, "final_score=100.0");
    }

    #[tokio::test]
    async fn submissions_filter_by_learner_and_module() {
        let repo = InMemoryRepository::new();
        let record = SubmissionRecord {
            student_id: StudentId::new("s1"),
            module_id: ModuleId::new("m1"),
            section_id: SectionId::new("quiz"),
            section_title: "Quiz".into(),
            section_type: ContentType::Assessment,
            answers: SectionAnswers::new(),
            submitted_at: fixed_now(),
            result: None,
            time_spent_seconds: 30,
            status: SubmissionStatus::Draft,
        };
        assert_eq!(repo.save_submission(&record).await.unwrap(), 1);

        let other = SubmissionRecord {
            module_id: ModuleId::new("m2"),
            ..record.clone()
        };
        repo.save_submission(&other).await.unwrap();

        let found = repo
            .list_submissions(&StudentId::new("s1"), &ModuleId::new("m1"))
            .await
            .unwrap();
        assert_eq!(found, vec![record]);
    }
}
