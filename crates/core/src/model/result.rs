use serde::{Deserialize, Serialize};

/// Verdict for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub is_correct: bool,
    pub earned_points: u32,
}

impl QuestionOutcome {
    #[must_use]
    pub fn correct(points: u32) -> Self {
        Self {
            is_correct: true,
            earned_points: points,
        }
    }

    #[must_use]
    pub fn incorrect() -> Self {
        Self {
            is_correct: false,
            earned_points: 0,
        }
    }
}

/// One row of the itemized result, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredQuestion {
    pub index: usize,
    pub question_id: String,
    pub is_correct: bool,
    pub earned_points: u32,
    pub possible_points: u32,
}

/// Aggregate score of one submitted question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub items: Vec<ScoredQuestion>,
    pub total_earned: u32,
    pub total_possible: u32,
    pub percentage: f64,
    pub correct_count: u32,
    pub total_questions: u32,
    pub passed: bool,
}

impl AssessmentResult {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total_possible > 0 && self.total_earned == self.total_possible
    }
}
