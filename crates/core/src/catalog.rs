//! Derives the navigable section list from the learner's audio preference.
//!
//! The filter is a pure function of `(sections, preference)`, so applying it
//! again with the same inputs hides exactly the same sections.

use std::collections::BTreeSet;

use crate::model::{AudioPreference, ContentType, Section, SectionId};

/// Whether `section` is redundant under `preference`.
#[must_use]
pub fn is_hidden(section: &Section, preference: AudioPreference) -> bool {
    match preference {
        AudioPreference::Unset => false,
        AudioPreference::Audio => section.content_type() == ContentType::ReadAloud,
        AudioPreference::ReadAloud => section.carries_audio(),
    }
}

/// Sections left to navigate, in module order.
#[must_use]
pub fn visible_sections(sections: &[Section], preference: AudioPreference) -> Vec<&Section> {
    sections
        .iter()
        .filter(|s| !is_hidden(s, preference))
        .collect()
}

/// Ids of the sections hidden by `preference`; these count as completed.
#[must_use]
pub fn auto_completed_ids(sections: &[Section], preference: AudioPreference) -> BTreeSet<SectionId> {
    sections
        .iter()
        .filter(|s| is_hidden(s, preference))
        .map(|s| s.id().clone())
        .collect()
}
