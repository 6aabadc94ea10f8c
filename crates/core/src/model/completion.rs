use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ModuleId, StudentId};

//
// ─── BADGE TIER ────────────────────────────────────────────────────────────────
//

/// Achievement level assigned from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl BadgeTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeTier::Bronze => "bronze",
            BadgeTier::Silver => "silver",
            BadgeTier::Gold => "gold",
            BadgeTier::Platinum => "platinum",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bronze" => Some(BadgeTier::Bronze),
            "silver" => Some(BadgeTier::Silver),
            "gold" => Some(BadgeTier::Gold),
            "platinum" => Some(BadgeTier::Platinum),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            BadgeTier::Platinum => "Perfect Mastery",
            BadgeTier::Gold => "Excellence",
            BadgeTier::Silver => "Proficiency",
            BadgeTier::Bronze => "Module Completed",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            BadgeTier::Platinum => "Scored 100% across every assessment in the module",
            BadgeTier::Gold => "Finished the module with an outstanding score",
            BadgeTier::Silver => "Finished the module with a strong score",
            BadgeTier::Bronze => "Worked through every section of the module",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            BadgeTier::Platinum => "trophy",
            BadgeTier::Gold => "medal-gold",
            BadgeTier::Silver => "medal-silver",
            BadgeTier::Bronze => "medal-bronze",
        }
    }

    #[must_use]
    pub fn rarity(self) -> &'static str {
        match self {
            BadgeTier::Platinum => "legendary",
            BadgeTier::Gold => "epic",
            BadgeTier::Silver => "rare",
            BadgeTier::Bronze => "common",
        }
    }
}

//
// ─── COMPLETION RECORD ─────────────────────────────────────────────────────────
//

/// Outcome of a finished module-viewing session, handed to the completion
/// collaborator once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub student_id: StudentId,
    pub module_id: ModuleId,
    pub final_score: f64,
    pub time_spent_minutes: u32,
    pub pre_test_score: Option<f64>,
    pub post_test_score: Option<f64>,
    pub sections_completed: u32,
    pub total_sections: u32,
    pub perfect_sections: u32,
    pub badge_tier: BadgeTier,
    pub completed_at: DateTime<Utc>,
}
