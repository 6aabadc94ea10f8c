mod completion;
mod ids;
mod module;
mod policy;
mod preference;
mod question;
mod result;
mod section;

pub use completion::{BadgeTier, CompletionRecord};
pub use ids::{ModuleId, ParseIdError, SectionId, SessionId, StudentId};
pub use module::{Module, ModuleError};
pub use policy::{ScoringPolicy, ScoringPolicyError};
pub use preference::{AudioPreference, PreferenceError};
pub use question::{
    AnswerEnvelope, AnswerValue, AssessmentQuestion, QuestionKind, RawAnswer, SectionAnswers,
};
pub use result::{AssessmentResult, QuestionOutcome, ScoredQuestion};
pub use section::{
    ActivityContent, ContentType, DiagramContent, InteractiveContent, LearningStyle,
    MediaContent, QuestionSet, QuickWriteContent, ReadAloudContent, Section, SectionContent,
    SectionError, TableContent, TextContent,
};
