use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::{ModuleId, SectionId};
use crate::model::question::AssessmentQuestion;
use crate::model::section::Section;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module id cannot be empty")]
    EmptyId,

    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct ModuleWire {
    id: String,
    title: String,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default, alias = "questions")]
    legacy_questions: Vec<AssessmentQuestion>,
}

/// Read-only learning module: sections in delivery order plus an optional
/// flat question list kept for modules authored before sections embedded
/// their own questions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ModuleWire")]
pub struct Module {
    id: ModuleId,
    title: String,
    sections: Vec<Section>,
    legacy_questions: Vec<AssessmentQuestion>,
}

impl TryFrom<ModuleWire> for Module {
    type Error = ModuleError;

    fn try_from(wire: ModuleWire) -> Result<Self, Self::Error> {
        Module::new(wire.id, wire.title, wire.sections)
            .map(|m| m.with_legacy_questions(wire.legacy_questions))
    }
}

impl Module {
    /// Creates a module from its ordered sections.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyId` for a blank id and
    /// `ModuleError::DuplicateSection` if two sections share an id.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        sections: Vec<Section>,
    ) -> Result<Self, ModuleError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModuleError::EmptyId);
        }

        let mut seen = HashSet::with_capacity(sections.len());
        for section in &sections {
            if !seen.insert(section.id()) {
                return Err(ModuleError::DuplicateSection(section.id().clone()));
            }
        }

        Ok(Self {
            id: ModuleId::new(id.trim()),
            title: title.into(),
            sections,
            legacy_questions: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_legacy_questions(mut self, questions: Vec<AssessmentQuestion>) -> Self {
        self.legacy_questions = questions;
        self
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn legacy_questions(&self) -> &[AssessmentQuestion] {
        &self.legacy_questions
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }

    /// Questions a section is scored against.
    ///
    /// Embedded questions win; an assessment section without any falls back to
    /// the module's legacy list. Sections that are not scored return `None`.
    #[must_use]
    pub fn questions_for<'a>(&'a self, section: &'a Section) -> Option<&'a [AssessmentQuestion]> {
        let embedded = section.content().questions()?;
        if embedded.is_empty() && section.is_assessment() && !self.legacy_questions.is_empty() {
            return Some(&self.legacy_questions);
        }
        Some(embedded)
    }
}
