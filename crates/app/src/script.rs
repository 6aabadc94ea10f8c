//! Scripted learner walk replayed by the `walk` command.

use lesson_core::model::{LearningStyle, RawAnswer, SectionId};
use serde::Deserialize;

/// One learner action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Mark a non-assessed section complete.
    Complete { section: SectionId },
    Answer {
        section: SectionId,
        index: usize,
        value: RawAnswer,
    },
    Draft { section: SectionId },
    Submit { section: SectionId },
    Next,
    Previous,
    /// Answer the pending preference prompt, or choose up front.
    Prefer { choice: String },
    RetryCompletion,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub learning_styles: Vec<LearningStyle>,
    pub steps: Vec<Action>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_actions() {
        let script: Script = serde_json::from_str(
            r#"{
                "learning_styles": ["auditory"],
                "steps": [
                    { "action": "complete", "section": "intro" },
                    { "action": "next" },
                    { "action": "prefer", "choice": "read_aloud" },
                    { "action": "answer", "section": "quiz", "index": 0, "value": { "selected": "B" } },
                    { "action": "submit", "section": "quiz" },
                    { "action": "retry_completion" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.learning_styles, vec![LearningStyle::Auditory]);
        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.steps[1], Action::Next);
        let Action::Answer { value, .. } = &script.steps[3] else {
            panic!("expected an answer step");
        };
        assert_eq!(value.normalized().and_then(|v| v.as_text()), Some("B".to_string()));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = serde_json::from_str::<Script>(r#"{ "steps": [{ "action": "skip" }] }"#);
        assert!(err.is_err());
    }
}
