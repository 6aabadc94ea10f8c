//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{PreferenceError, SectionId};
use storage::repository::StorageError;

/// Errors emitted by the completion workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("module is not complete yet")]
    NotReady,
    #[error("failed to persist completion record: {0}")]
    Persist(#[source] StorageError),
}

/// Errors emitted by session services.
///
/// Navigation blocks are not errors; they come back as values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown section: {0}")]
    UnknownSection(SectionId),
    #[error("section {0} has no questions to score")]
    NotScorable(SectionId),
    #[error("assessment {0} completes only by submitting it")]
    SubmissionRequired(SectionId),
    #[error("required questions unanswered in {section}: {indexes:?}")]
    Unanswered {
        section: SectionId,
        indexes: Vec<usize>,
    },
    #[error("resume token does not match the pending preference prompt")]
    InvalidResumeToken,
    #[error(transparent)]
    Preference(#[from] PreferenceError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
