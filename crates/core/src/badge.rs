//! Final score, perfect-section count and badge tier for a finished module.

use crate::model::{AssessmentResult, BadgeTier, ScoringPolicy};

/// One scored section as seen by the completion evaluator, in module order.
#[derive(Debug, Clone, Copy)]
pub struct ScoredSection<'a> {
    pub is_pre_test: bool,
    pub is_post_test: bool,
    pub result: &'a AssessmentResult,
}

/// Aggregate outcome derived from every scored section of the module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleScore {
    pub final_score: f64,
    pub perfect_sections: u32,
    pub pre_test_score: Option<f64>,
    pub post_test_score: Option<f64>,
    pub badge_tier: BadgeTier,
}

/// Maps a final score onto a badge tier.
#[must_use]
pub fn tier_for(final_score: f64, policy: &ScoringPolicy) -> BadgeTier {
    if final_score >= policy.platinum_threshold() {
        BadgeTier::Platinum
    } else if final_score >= policy.gold_threshold() {
        BadgeTier::Gold
    } else if final_score >= policy.silver_threshold() {
        BadgeTier::Silver
    } else {
        BadgeTier::Bronze
    }
}

/// Evaluates the module outcome.
///
/// The final score is the mean percentage of the sections that had points to
/// earn. Without any, the latest post-test percentage is used, and 0 when
/// there is no post-test either.
#[must_use]
pub fn evaluate(sections: &[ScoredSection<'_>], policy: &ScoringPolicy) -> ModuleScore {
    let gradable: Vec<f64> = sections
        .iter()
        .filter(|s| s.result.total_possible > 0)
        .map(|s| s.result.percentage)
        .collect();

    let post_test_score = sections
        .iter()
        .rev()
        .find(|s| s.is_post_test)
        .map(|s| s.result.percentage);
    let pre_test_score = sections
        .iter()
        .find(|s| s.is_pre_test)
        .map(|s| s.result.percentage);

    #[allow(clippy::cast_precision_loss)]
    let final_score = if gradable.is_empty() {
        post_test_score.unwrap_or(0.0)
    } else {
        gradable.iter().sum::<f64>() / gradable.len() as f64
    };

    let perfect_sections = sections.iter().filter(|s| s.result.is_perfect()).count();

    ModuleScore {
        final_score,
        perfect_sections: u32::try_from(perfect_sections).unwrap_or(u32::MAX),
        pre_test_score,
        post_test_score,
        badge_tier: tier_for(final_score, policy),
    }
}
