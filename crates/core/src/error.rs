use thiserror::Error;

use crate::model::{ModuleError, PreferenceError, ScoringPolicyError};

/// Umbrella error for callers that only need to know the domain layer failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Preference(#[from] PreferenceError),
    #[error(transparent)]
    ScoringPolicy(#[from] ScoringPolicyError),
}
