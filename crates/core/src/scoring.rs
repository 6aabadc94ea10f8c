use crate::model::{AssessmentQuestion, AssessmentResult, ScoredQuestion, ScoringPolicy, SectionAnswers};
use crate::validator::validate;

/// Aggregates per-question verdicts into a section result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    policy: ScoringPolicy,
}

impl Scorer {
    #[must_use]
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Scores `answers` (keyed by question index) against `questions`.
    ///
    /// Items keep question order. The percentage is 0 when no points are
    /// possible. Scoring is a pure function of its inputs.
    #[must_use]
    pub fn score(&self, questions: &[AssessmentQuestion], answers: &SectionAnswers) -> AssessmentResult {
        let mut items = Vec::with_capacity(questions.len());
        let mut total_earned = 0_u32;
        let mut total_possible = 0_u32;
        let mut correct_count = 0_u32;

        for (index, question) in questions.iter().enumerate() {
            let answer = answers.get(&index).and_then(|raw| raw.normalized());
            let outcome = validate(question, answer);

            total_earned = total_earned.saturating_add(outcome.earned_points);
            total_possible = total_possible.saturating_add(question.points);
            if outcome.is_correct {
                correct_count = correct_count.saturating_add(1);
            }

            items.push(ScoredQuestion {
                index,
                question_id: question.id.clone(),
                is_correct: outcome.is_correct,
                earned_points: outcome.earned_points,
                possible_points: question.points,
            });
        }

        let percentage = if total_possible == 0 {
            0.0
        } else {
            f64::from(total_earned) / f64::from(total_possible) * 100.0
        };

        AssessmentResult {
            items,
            total_earned,
            total_possible,
            percentage,
            correct_count,
            total_questions: u32::try_from(questions.len()).unwrap_or(u32::MAX),
            passed: percentage >= self.policy.pass_threshold(),
        }
    }
}

/// Scores with the standard policy.
#[must_use]
pub fn score(questions: &[AssessmentQuestion], answers: &SectionAnswers) -> AssessmentResult {
    Scorer::default().score(questions, answers)
}

/// Indexes of required questions with no usable answer, in question order.
#[must_use]
pub fn unanswered_required(questions: &[AssessmentQuestion], answers: &SectionAnswers) -> Vec<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(index, q)| {
            q.required && answers.get(index).and_then(|raw| raw.normalized()).is_none()
        })
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerValue, QuestionKind, RawAnswer};
    use serde_json::json;

    fn single(id: &str, correct: &str, points: u32) -> AssessmentQuestion {
        AssessmentQuestion::new(id, QuestionKind::SingleChoice, id)
            .with_correct(AnswerValue::Text(correct.into()))
            .with_points(points)
    }

    #[test]
    fn partial_score_fails() {
        let questions = vec![single("q1", "A", 1), single("q2", "B", 2)];
        let answers = SectionAnswers::from([(0, RawAnswer::text("A")), (1, RawAnswer::text("C"))]);

        let result = score(&questions, &answers);

        assert_eq!(result.total_earned, 1);
        assert_eq!(result.total_possible, 3);
        assert!((result.percentage - 33.333).abs() < 0.01);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.total_questions, 2);
        assert!(!result.passed);
    }

    #[test]
    fn items_preserve_question_order() {
        let questions = vec![single("q1", "A", 1), single("q2", "B", 1), single("q3", "C", 1)];
        let answers = SectionAnswers::from([(2, RawAnswer::text("C")), (0, RawAnswer::text("A"))]);

        let result = score(&questions, &answers);
        let ids: Vec<_> = result.items.iter().map(|i| i.question_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2", "q3"]);
        assert!(result.items[0].is_correct);
        assert!(!result.items[1].is_correct);
        assert!((result.percentage - 66.666).abs() < 0.01);
        assert!(result.passed);
    }

    #[test]
    fn empty_question_list_scores_zero() {
        let result = score(&[], &SectionAnswers::new());
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
        assert!(!result.is_perfect());
    }

    #[test]
    fn wrapped_answers_are_unwrapped_before_grading() {
        let questions = vec![single("q1", "B", 1)];
        let raw: RawAnswer = serde_json::from_value(json!({ "value": "B" })).unwrap();
        let result = score(&questions, &SectionAnswers::from([(0, raw)]));
        assert!(result.is_perfect());
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let questions = vec![single("q1", "A", 1), single("q2", "B", 2)];
        let answers = SectionAnswers::from([(0, RawAnswer::text("A")), (1, RawAnswer::text("B"))]);
        assert_eq!(score(&questions, &answers), score(&questions, &answers));
    }

    #[test]
    fn custom_pass_threshold_applies() {
        let policy = ScoringPolicy::new(70.0, 100.0, 90.0, 80.0).unwrap();
        let questions = vec![single("q1", "A", 2), single("q2", "B", 1)];
        let answers = SectionAnswers::from([(0, RawAnswer::text("A"))]);
        let result = Scorer::new(policy).score(&questions, &answers);
        assert!(!result.passed);
        assert!(score(&questions, &answers).passed);
    }

    #[test]
    fn unanswered_required_lists_missing_indexes() {
        let questions = vec![
            single("q1", "A", 1),
            single("q2", "B", 1).optional(),
            single("q3", "C", 1),
        ];
        let answers = SectionAnswers::from([(0, RawAnswer::text("  "))]);
        assert_eq!(unanswered_required(&questions, &answers), vec![0, 2]);
    }
}
