use lesson_core::model::{AudioPreference, BadgeTier, CompletionRecord, SectionId};
use serde::Serialize;

/// Aggregated view of module progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub total_sections: usize,
    pub completed_sections: usize,
    pub percentage: f64,
    pub current_index: usize,
    pub current_section: Option<SectionId>,
    pub preference: AudioPreference,
    pub is_complete: bool,
}

/// Where the fire-once completion guard stands.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionStatus {
    NotFired,
    /// The guard is set but the record has not been stored yet.
    Pending(CompletionRecord),
    Persisted {
        record: CompletionRecord,
        badge_awarded: bool,
    },
}

impl CompletionStatus {
    #[must_use]
    pub fn has_fired(&self) -> bool {
        !matches!(self, CompletionStatus::NotFired)
    }

    #[must_use]
    pub fn record(&self) -> Option<&CompletionRecord> {
        match self {
            CompletionStatus::NotFired => None,
            CompletionStatus::Pending(record) | CompletionStatus::Persisted { record, .. } => {
                Some(record)
            }
        }
    }
}

/// Payload handed to the host once a module completion is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionEvent {
    pub record: CompletionRecord,
    pub badge_awarded: bool,
}

impl CompletionEvent {
    #[must_use]
    pub fn badge_tier(&self) -> BadgeTier {
        self.record.badge_tier
    }

    #[must_use]
    pub fn badge_name(&self) -> &'static str {
        self.record.badge_tier.display_name()
    }
}
