use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// How a question is answered and therefore how it is graded.
///
/// Unknown type tags (audio recordings, drawings, widget-specific answers)
/// deserialize to `Other` and earn participation credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    #[serde(other)]
    Other,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::Other => "other",
        }
    }
}

//
// ─── ANSWER VALUES ─────────────────────────────────────────────────────────────
//

/// A plain answer value, also used for the expected answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Index(i64),
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    /// Textual view used for free-text comparison. `None` for multi-selections.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            AnswerValue::Flag(b) => Some(b.to_string()),
            AnswerValue::Index(i) => Some(i.to_string()),
            AnswerValue::Text(s) => Some(s.clone()),
            AnswerValue::Choices(_) => None,
        }
    }

    /// Boolean view for true/false questions; widgets may send `"true"`/`"false"` text.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AnswerValue::Flag(b) => Some(*b),
            AnswerValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            AnswerValue::Index(_) | AnswerValue::Choices(_) => None,
        }
    }

    /// Set view used for multiple-choice comparison. A single value is a one-element set.
    #[must_use]
    pub fn as_choice_set(&self) -> Option<BTreeSet<String>> {
        match self {
            AnswerValue::Flag(_) => None,
            AnswerValue::Index(i) => Some(BTreeSet::from([i.to_string()])),
            AnswerValue::Text(s) => Some(BTreeSet::from([s.clone()])),
            AnswerValue::Choices(items) => Some(items.iter().cloned().collect()),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Choices(items) => items.iter().all(|s| s.trim().is_empty()),
            AnswerValue::Flag(_) | AnswerValue::Index(_) => false,
        }
    }
}

/// Envelope some input widgets put around the selected value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    #[serde(
        default,
        alias = "selected",
        alias = "value",
        alias = "text",
        alias = "response"
    )]
    pub answer: Option<AnswerValue>,
}

/// An answer as captured from the UI, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Plain(AnswerValue),
    Wrapped(AnswerEnvelope),
}

impl RawAnswer {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Plain(AnswerValue::Text(s.into()))
    }

    #[must_use]
    pub fn flag(b: bool) -> Self {
        Self::Plain(AnswerValue::Flag(b))
    }

    #[must_use]
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Plain(AnswerValue::Choices(items.into_iter().map(Into::into).collect()))
    }

    /// Strips widget envelopes down to the plain value.
    ///
    /// Blank text and empty selections count as "no answer".
    #[must_use]
    pub fn normalized(&self) -> Option<&AnswerValue> {
        let value = match self {
            RawAnswer::Plain(v) => v,
            RawAnswer::Wrapped(env) => env.answer.as_ref()?,
        };
        if value.is_blank() { None } else { Some(value) }
    }
}

/// Answers for one section keyed by question index.
pub type SectionAnswers = BTreeMap<usize, RawAnswer>;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

fn default_points() -> u32 {
    1
}

fn default_required() -> bool {
    true
}

/// One gradeable question embedded in an assessment-like section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<AnswerValue>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl AssessmentQuestion {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: QuestionKind, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            prompt: prompt.into(),
            options: Vec::new(),
            correct_answer: None,
            points: default_points(),
            explanation: None,
            required: default_required(),
        }
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_correct(mut self, answer: AnswerValue) -> Self {
        self.correct_answer = Some(answer);
        self
    }

    #[must_use]
    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Questions without an expected answer are accepted as-is.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.correct_answer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_question_types_map_to_other() {
        let q: AssessmentQuestion = serde_json::from_value(serde_json::json!({
            "type": "audio_recording",
            "prompt": "Read the passage aloud"
        }))
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Other);
        assert_eq!(q.points, 1);
        assert!(q.required);
        assert!(!q.is_graded());
    }

    #[test]
    fn question_accepts_legacy_prompt_alias() {
        let q: AssessmentQuestion = serde_json::from_value(serde_json::json!({
            "id": "q1",
            "type": "multiple_choice",
            "question": "Pick the planets",
            "options": ["Mars", "Moon", "Venus"],
            "correct_answer": ["Mars", "Venus"],
            "points": 2
        }))
        .unwrap();
        assert_eq!(q.prompt, "Pick the planets");
        assert_eq!(
            q.correct_answer,
            Some(AnswerValue::Choices(vec!["Mars".into(), "Venus".into()]))
        );
    }

    #[test]
    fn widget_envelopes_normalize_to_plain_values() {
        let wrapped: RawAnswer =
            serde_json::from_value(serde_json::json!({ "selected": "B" })).unwrap();
        assert_eq!(wrapped.normalized(), Some(&AnswerValue::Text("B".into())));

        let plain: RawAnswer = serde_json::from_value(serde_json::json!(true)).unwrap();
        assert_eq!(plain.normalized(), Some(&AnswerValue::Flag(true)));
    }

    #[test]
    fn blank_answers_normalize_to_none() {
        assert_eq!(RawAnswer::text("   ").normalized(), None);
        assert_eq!(RawAnswer::choices(Vec::<String>::new()).normalized(), None);
        let empty: RawAnswer = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty.normalized(), None);
    }
}
