//! Grades a single answer against a single question.

use crate::model::{AnswerValue, AssessmentQuestion, QuestionKind, QuestionOutcome};

/// Grades `answer` (already normalized, `None` when unanswered) against `question`.
///
/// - No expected answer: always correct with full points.
/// - Single choice: exact equality.
/// - True-false: equal flags, with `"true"`/`"false"` text read as flags.
/// - Multiple choice: the selected set must equal the expected set exactly.
/// - Short answer: trimmed, case-insensitive text equality.
/// - Anything else: correct iff an answer was supplied.
///
/// # Examples
///
/// ```
/// # use lesson_core::model::{AnswerValue, AssessmentQuestion, QuestionKind};
/// # use lesson_core::validator::validate;
/// let q = AssessmentQuestion::new("q1", QuestionKind::ShortAnswer, "Capital of France?")
///     .with_correct(AnswerValue::Text("Paris".into()));
/// let outcome = validate(&q, Some(&AnswerValue::Text("  paris ".into())));
/// assert!(outcome.is_correct);
/// assert_eq!(outcome.earned_points, 1);
/// ```
#[must_use]
pub fn validate(question: &AssessmentQuestion, answer: Option<&AnswerValue>) -> QuestionOutcome {
    let Some(expected) = question.correct_answer.as_ref() else {
        return QuestionOutcome::correct(question.points);
    };

    let is_correct = match question.kind {
        QuestionKind::SingleChoice => answer == Some(expected),
        QuestionKind::TrueFalse => answer.is_some_and(|given| same_flag(given, expected)),
        QuestionKind::MultipleChoice => answer.is_some_and(|given| same_selection(given, expected)),
        QuestionKind::ShortAnswer => answer.is_some_and(|given| same_text(given, expected)),
        QuestionKind::Other => answer.is_some(),
    };

    if is_correct {
        QuestionOutcome::correct(question.points)
    } else {
        QuestionOutcome::incorrect()
    }
}

fn same_flag(given: &AnswerValue, expected: &AnswerValue) -> bool {
    match (given.as_flag(), expected.as_flag()) {
        (Some(given), Some(expected)) => given == expected,
        _ => given == expected,
    }
}

fn same_selection(given: &AnswerValue, expected: &AnswerValue) -> bool {
    match (given.as_choice_set(), expected.as_choice_set()) {
        (Some(given), Some(expected)) => given == expected,
        _ => given == expected,
    }
}

fn same_text(given: &AnswerValue, expected: &AnswerValue) -> bool {
    match (given.as_text(), expected.as_text()) {
        (Some(given), Some(expected)) => {
            given.trim().to_lowercase() == expected.trim().to_lowercase()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> AnswerValue {
        AnswerValue::Text(s.into())
    }

    fn choices(items: &[&str]) -> AnswerValue {
        AnswerValue::Choices(items.iter().map(|s| (*s).to_string()).collect())
    }

    fn question(kind: QuestionKind, correct: AnswerValue) -> AssessmentQuestion {
        AssessmentQuestion::new("q", kind, "prompt")
            .with_correct(correct)
            .with_points(3)
    }

    #[test]
    fn ungraded_question_is_always_correct() {
        let q = AssessmentQuestion::new("q", QuestionKind::SingleChoice, "Opinion?").with_points(2);
        assert_eq!(validate(&q, None), QuestionOutcome::correct(2));
        assert_eq!(validate(&q, Some(&text("anything"))), QuestionOutcome::correct(2));
    }

    #[test]
    fn single_choice_requires_exact_match() {
        let q = question(QuestionKind::SingleChoice, text("A"));
        assert_eq!(validate(&q, Some(&text("A"))), QuestionOutcome::correct(3));
        assert_eq!(validate(&q, Some(&text("a"))), QuestionOutcome::incorrect());
        assert_eq!(validate(&q, Some(&text("B"))), QuestionOutcome::incorrect());
        assert_eq!(validate(&q, None), QuestionOutcome::incorrect());
    }

    #[test]
    fn true_false_compares_flags() {
        let q = question(QuestionKind::TrueFalse, AnswerValue::Flag(false));
        assert!(validate(&q, Some(&AnswerValue::Flag(false))).is_correct);
        assert!(!validate(&q, Some(&AnswerValue::Flag(true))).is_correct);
    }

    #[test]
    fn true_false_reads_text_from_widgets() {
        let q = question(QuestionKind::TrueFalse, AnswerValue::Flag(true));
        assert!(validate(&q, Some(&text("true"))).is_correct);
        assert!(validate(&q, Some(&text(" True "))).is_correct);
        assert!(!validate(&q, Some(&text("false"))).is_correct);
        assert!(!validate(&q, Some(&text("yes"))).is_correct);

        let q = question(QuestionKind::TrueFalse, text("false"));
        assert!(validate(&q, Some(&AnswerValue::Flag(false))).is_correct);
    }

    #[test]
    fn multiple_choice_needs_exact_set() {
        let q = question(QuestionKind::MultipleChoice, choices(&["A", "B"]));
        assert!(!validate(&q, Some(&choices(&["A"]))).is_correct);
        assert!(validate(&q, Some(&choices(&["A", "B"]))).is_correct);
        assert!(validate(&q, Some(&choices(&["B", "A"]))).is_correct);
        assert!(!validate(&q, Some(&choices(&["A", "B", "C"]))).is_correct);
    }

    #[test]
    fn multiple_choice_single_expected_accepts_single_value() {
        let q = question(QuestionKind::MultipleChoice, text("A"));
        assert!(validate(&q, Some(&choices(&["A"]))).is_correct);
        assert!(validate(&q, Some(&text("A"))).is_correct);
    }

    #[test]
    fn short_answer_ignores_case_and_whitespace() {
        let q = question(QuestionKind::ShortAnswer, text("Photosynthesis"));
        assert!(validate(&q, Some(&text("  photosynthesis\n"))).is_correct);
        assert!(!validate(&q, Some(&text("photo synthesis"))).is_correct);
    }

    #[test]
    fn short_answer_compares_numbers_as_text() {
        let q = question(QuestionKind::ShortAnswer, AnswerValue::Index(42));
        assert!(validate(&q, Some(&text(" 42 "))).is_correct);
    }

    #[test]
    fn other_kinds_earn_participation_credit() {
        let q = question(QuestionKind::Other, text("ignored"));
        assert_eq!(validate(&q, Some(&text("my drawing"))), QuestionOutcome::correct(3));
        assert_eq!(validate(&q, None), QuestionOutcome::incorrect());
    }
}
