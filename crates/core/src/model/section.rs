use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SectionId;
use crate::model::question::AssessmentQuestion;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SectionError {
    #[error("section id cannot be empty")]
    EmptyId,

    #[error("invalid {content_type} payload for section {section}: {source}")]
    InvalidPayload {
        section: String,
        content_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

//
// ─── LEARNING STYLES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Everyone,
    Visual,
    Auditory,
    ReadingWriting,
    Kinesthetic,
}

//
// ─── CONTENT TYPE TAG ──────────────────────────────────────────────────────────
//

/// Bare content-type tag, as stored alongside submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Video,
    Audio,
    ReadAloud,
    Table,
    Diagram,
    Interactive,
    Assessment,
    QuickCheck,
    QuickWrite,
    Activity,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
            ContentType::ReadAloud => "read_aloud",
            ContentType::Table => "table",
            ContentType::Diagram => "diagram",
            ContentType::Interactive => "interactive",
            ContentType::Assessment => "assessment",
            ContentType::QuickCheck => "quick_check",
            ContentType::QuickWrite => "quick_write",
            ContentType::Activity => "activity",
        }
    }

    /// Parses the snake_case tag used on the wire and in storage.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let ty = match raw {
            "text" => ContentType::Text,
            "video" => ContentType::Video,
            "audio" => ContentType::Audio,
            "read_aloud" => ContentType::ReadAloud,
            "table" => ContentType::Table,
            "diagram" => ContentType::Diagram,
            "interactive" => ContentType::Interactive,
            "assessment" => ContentType::Assessment,
            "quick_check" => ContentType::QuickCheck,
            "quick_write" => ContentType::QuickWrite,
            "activity" => ContentType::Activity,
            _ => return None,
        };
        Some(ty)
    }
}

//
// ─── CONTENT PAYLOADS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    #[serde(alias = "content", alias = "html")]
    pub body: String,
    pub audio_url: Option<String>,
    /// Inline audio (e.g. a base64 data URI).
    pub audio_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaContent {
    pub url: String,
    pub transcript: Option<String>,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadAloudContent {
    pub text: String,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableContent {
    pub caption: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramContent {
    pub image_url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveContent {
    pub instructions: String,
    pub widget: Option<String>,
}

/// Embedded question list of an assessment or quick check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionSet {
    pub instructions: Option<String>,
    pub questions: Vec<AssessmentQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickWriteContent {
    pub prompt: String,
    pub min_words: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityContent {
    pub instructions: String,
    pub steps: Vec<String>,
}

/// Content of a section: one variant per content type, each with its own payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContent {
    Text(TextContent),
    Video(MediaContent),
    Audio(MediaContent),
    ReadAloud(ReadAloudContent),
    Table(TableContent),
    Diagram(DiagramContent),
    Interactive(InteractiveContent),
    Assessment(QuestionSet),
    QuickCheck(QuestionSet),
    QuickWrite(QuickWriteContent),
    Activity(ActivityContent),
}

impl SectionContent {
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match self {
            SectionContent::Text(_) => ContentType::Text,
            SectionContent::Video(_) => ContentType::Video,
            SectionContent::Audio(_) => ContentType::Audio,
            SectionContent::ReadAloud(_) => ContentType::ReadAloud,
            SectionContent::Table(_) => ContentType::Table,
            SectionContent::Diagram(_) => ContentType::Diagram,
            SectionContent::Interactive(_) => ContentType::Interactive,
            SectionContent::Assessment(_) => ContentType::Assessment,
            SectionContent::QuickCheck(_) => ContentType::QuickCheck,
            SectionContent::QuickWrite(_) => ContentType::QuickWrite,
            SectionContent::Activity(_) => ContentType::Activity,
        }
    }

    /// Builds the variant for `content_type` from its untyped payload.
    ///
    /// A missing (`null`) payload yields the variant's default payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload does not match the variant's shape.
    pub fn from_parts(
        content_type: ContentType,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let data = if data.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            data
        };
        let content = match content_type {
            ContentType::Text => SectionContent::Text(serde_json::from_value(data)?),
            ContentType::Video => SectionContent::Video(serde_json::from_value(data)?),
            ContentType::Audio => SectionContent::Audio(serde_json::from_value(data)?),
            ContentType::ReadAloud => SectionContent::ReadAloud(serde_json::from_value(data)?),
            ContentType::Table => SectionContent::Table(serde_json::from_value(data)?),
            ContentType::Diagram => SectionContent::Diagram(serde_json::from_value(data)?),
            ContentType::Interactive => SectionContent::Interactive(serde_json::from_value(data)?),
            ContentType::Assessment => SectionContent::Assessment(serde_json::from_value(data)?),
            ContentType::QuickCheck => SectionContent::QuickCheck(serde_json::from_value(data)?),
            ContentType::QuickWrite => SectionContent::QuickWrite(serde_json::from_value(data)?),
            ContentType::Activity => SectionContent::Activity(serde_json::from_value(data)?),
        };
        Ok(content)
    }

    /// Questions embedded in the payload, for sections that are scored.
    #[must_use]
    pub fn questions(&self) -> Option<&[AssessmentQuestion]> {
        match self {
            SectionContent::Assessment(set) | SectionContent::QuickCheck(set) => {
                Some(&set.questions)
            }
            SectionContent::Text(_)
            | SectionContent::Video(_)
            | SectionContent::Audio(_)
            | SectionContent::ReadAloud(_)
            | SectionContent::Table(_)
            | SectionContent::Diagram(_)
            | SectionContent::Interactive(_)
            | SectionContent::QuickWrite(_)
            | SectionContent::Activity(_) => None,
        }
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

const AUDIO_MARKERS: [&str; 3] = ["<audio", "audio-player", "data-audio"];
const AUDIO_EXTENSIONS: [&str; 6] = [".mp3", ".wav", ".ogg", ".m4a", ".aac", ".flac"];

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SectionWire {
    id: String,
    title: String,
    content_type: ContentType,
    #[serde(default)]
    content_data: serde_json::Value,
    #[serde(default, alias = "learning_styles")]
    learning_style_tags: BTreeSet<LearningStyle>,
    #[serde(default)]
    time_estimate_minutes: u32,
    #[serde(default = "default_required")]
    is_required: bool,
}

/// One unit of module content with its own completion status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SectionWire")]
pub struct Section {
    id: SectionId,
    title: String,
    content: SectionContent,
    learning_styles: BTreeSet<LearningStyle>,
    time_estimate_minutes: u32,
    is_required: bool,
}

impl TryFrom<SectionWire> for Section {
    type Error = SectionError;

    fn try_from(wire: SectionWire) -> Result<Self, Self::Error> {
        let content =
            SectionContent::from_parts(wire.content_type, wire.content_data).map_err(|source| {
                SectionError::InvalidPayload {
                    section: wire.id.clone(),
                    content_type: wire.content_type.as_str(),
                    source,
                }
            })?;
        let mut section = Section::new(wire.id, wire.title, content)?
            .with_learning_styles(wire.learning_style_tags)
            .with_time_estimate(wire.time_estimate_minutes);
        section.is_required = wire.is_required;
        Ok(section)
    }
}

impl Section {
    /// Creates a required section with no learning-style tags.
    ///
    /// # Errors
    ///
    /// Returns `SectionError::EmptyId` if `id` is blank.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: SectionContent,
    ) -> Result<Self, SectionError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SectionError::EmptyId);
        }
        Ok(Self {
            id: SectionId::new(id.trim()),
            title: title.into(),
            content,
            learning_styles: BTreeSet::new(),
            time_estimate_minutes: 0,
            is_required: true,
        })
    }

    #[must_use]
    pub fn with_learning_styles(mut self, styles: impl IntoIterator<Item = LearningStyle>) -> Self {
        self.learning_styles = styles.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_time_estimate(mut self, minutes: u32) -> Self {
        self.time_estimate_minutes = minutes;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    #[must_use]
    pub fn learning_styles(&self) -> &BTreeSet<LearningStyle> {
        &self.learning_styles
    }

    #[must_use]
    pub fn time_estimate_minutes(&self) -> u32 {
        self.time_estimate_minutes
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    #[must_use]
    pub fn is_assessment(&self) -> bool {
        matches!(self.content, SectionContent::Assessment(_))
    }

    #[must_use]
    pub fn is_pre_test(&self) -> bool {
        self.matches_marker(&["pre-test", "pretest"])
    }

    #[must_use]
    pub fn is_post_test(&self) -> bool {
        self.matches_marker(&["post-test", "posttest"])
    }

    fn matches_marker(&self, markers: &[&str]) -> bool {
        let id = self.id.as_str().to_lowercase();
        let title = self.title.to_lowercase();
        markers
            .iter()
            .any(|m| id.contains(m) || title.contains(m))
    }

    /// Whether this section delivers its material as audio.
    ///
    /// True for audio sections, and for text sections that embed audio data,
    /// carry player markup or audio file links, or are tagged auditory.
    #[must_use]
    pub fn carries_audio(&self) -> bool {
        match &self.content {
            SectionContent::Audio(_) => true,
            SectionContent::Text(text) => {
                text.audio_data.as_deref().is_some_and(|d| !d.trim().is_empty())
                    || text.audio_url.as_deref().is_some_and(|u| !u.trim().is_empty())
                    || body_mentions_audio(&text.body)
                    || self.learning_styles.contains(&LearningStyle::Auditory)
            }
            SectionContent::Video(_)
            | SectionContent::ReadAloud(_)
            | SectionContent::Table(_)
            | SectionContent::Diagram(_)
            | SectionContent::Interactive(_)
            | SectionContent::Assessment(_)
            | SectionContent::QuickCheck(_)
            | SectionContent::QuickWrite(_)
            | SectionContent::Activity(_) => false,
        }
    }
}

fn body_mentions_audio(body: &str) -> bool {
    let body = body.to_lowercase();
    AUDIO_MARKERS.iter().any(|m| body.contains(m))
        || AUDIO_EXTENSIONS.iter().any(|ext| body.contains(ext))
}
