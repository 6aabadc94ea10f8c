use std::collections::BTreeSet;

use crate::model::SectionId;

/// Per-section completion flags for one session.
///
/// Monotonic: a section once marked complete stays complete. Entries for
/// sections outside the currently visible set are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLedger {
    completed: BTreeSet<SectionId>,
}

impl ProgressLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `section_id` complete. Returns `true` if it was not complete before.
    pub fn mark_complete(&mut self, section_id: &SectionId) -> bool {
        if self.completed.contains(section_id) {
            return false;
        }
        self.completed.insert(section_id.clone())
    }

    #[must_use]
    pub fn is_complete(&self, section_id: &SectionId) -> bool {
        self.completed.contains(section_id)
    }

    /// Number of `visible` sections marked complete.
    #[must_use]
    pub fn completed_count<'a>(&self, visible: impl IntoIterator<Item = &'a SectionId>) -> usize {
        visible
            .into_iter()
            .filter(|id| self.completed.contains(*id))
            .count()
    }

    /// Completion percentage over `visible` only; 0 for an empty set.
    #[must_use]
    pub fn completion_percentage<'a>(
        &self,
        visible: impl IntoIterator<Item = &'a SectionId>,
    ) -> f64 {
        let mut total = 0_u32;
        let mut done = 0_u32;
        for id in visible {
            total += 1;
            if self.completed.contains(id) {
                done += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            f64::from(done) / f64::from(total) * 100.0
        }
    }

    /// True when `visible` is non-empty and every entry is complete.
    #[must_use]
    pub fn is_fully_complete<'a>(&self, visible: impl IntoIterator<Item = &'a SectionId>) -> bool {
        let mut any = false;
        for id in visible {
            if !self.completed.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    /// All completed ids, including sections that are currently hidden.
    pub fn completed_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.completed.iter()
    }
}
