use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoringPolicyError {
    #[error("{field} must be within 0..=100, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("badge thresholds must satisfy silver <= gold <= platinum")]
    UnorderedThresholds,
}

/// Thresholds used by the scorer and the badge evaluator, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pass_threshold: f64,
    platinum_threshold: f64,
    gold_threshold: f64,
    silver_threshold: f64,
}

impl ScoringPolicy {
    /// Pass at 60%, platinum at 100%, gold at 90%, silver at 80%.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            pass_threshold: 60.0,
            platinum_threshold: 100.0,
            gold_threshold: 90.0,
            silver_threshold: 80.0,
        }
    }

    /// Creates a custom policy.
    ///
    /// # Errors
    ///
    /// Returns `ScoringPolicyError::OutOfRange` for a threshold outside `0..=100`
    /// and `ScoringPolicyError::UnorderedThresholds` if the badge tiers are not ordered.
    pub fn new(
        pass_threshold: f64,
        platinum_threshold: f64,
        gold_threshold: f64,
        silver_threshold: f64,
    ) -> Result<Self, ScoringPolicyError> {
        for (field, value) in [
            ("pass_threshold", pass_threshold),
            ("platinum_threshold", platinum_threshold),
            ("gold_threshold", gold_threshold),
            ("silver_threshold", silver_threshold),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ScoringPolicyError::OutOfRange { field, value });
            }
        }
        if silver_threshold > gold_threshold || gold_threshold > platinum_threshold {
            return Err(ScoringPolicyError::UnorderedThresholds);
        }

        Ok(Self {
            pass_threshold,
            platinum_threshold,
            gold_threshold,
            silver_threshold,
        })
    }

    #[must_use]
    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    #[must_use]
    pub fn platinum_threshold(&self) -> f64 {
        self.platinum_threshold
    }

    #[must_use]
    pub fn gold_threshold(&self) -> f64 {
        self.gold_threshold
    }

    #[must_use]
    pub fn silver_threshold(&self) -> f64 {
        self.silver_threshold
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
