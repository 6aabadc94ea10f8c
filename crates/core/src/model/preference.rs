use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreferenceError {
    #[error("audio preference already chosen for this session")]
    AlreadyChosen,

    #[error("a preference choice must be audio or read_aloud")]
    UnsetChoice,

    #[error("unknown audio preference: {0}")]
    Unknown(String),
}

/// Learner's one-time choice between recorded audio and read-aloud delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioPreference {
    #[default]
    Unset,
    Audio,
    ReadAloud,
}

impl AudioPreference {
    #[must_use]
    pub fn is_unset(self) -> bool {
        matches!(self, AudioPreference::Unset)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AudioPreference::Unset => "unset",
            AudioPreference::Audio => "audio",
            AudioPreference::ReadAloud => "read_aloud",
        }
    }

    /// Parses a learner choice. `unset` is not a choice.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError::UnsetChoice` for `unset` and
    /// `PreferenceError::Unknown` for anything unrecognized.
    pub fn parse_choice(raw: &str) -> Result<Self, PreferenceError> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "audio" => Ok(AudioPreference::Audio),
            "read_aloud" => Ok(AudioPreference::ReadAloud),
            "unset" | "" => Err(PreferenceError::UnsetChoice),
            other => Err(PreferenceError::Unknown(other.to_string())),
        }
    }
}
