//! Forward-navigation state machine over the visible section list.
//!
//! Backward navigation is never blocked. Forward navigation is checked
//! against, in order: an unsubmitted assessment, an incomplete current
//! section, the end of the module, and the one-time audio preference prompt
//! in front of a pre-test.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ledger::ProgressLedger;
use crate::model::{AssessmentResult, AudioPreference, LearningStyle, Section, SectionId};

//
// ─── BLOCK REASONS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The current assessment has no recorded result yet.
    SubmitAssessment,
    /// The current section is not marked complete.
    CompleteSection,
    /// The last section was reached while earlier sections are still open.
    CompleteAllSections,
}

impl BlockReason {
    /// User-facing message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            BlockReason::SubmitAssessment => "submit assessment first",
            BlockReason::CompleteSection => "complete this section first",
            BlockReason::CompleteAllSections => "complete all sections first",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Continuation for a transition suspended on the audio preference prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeToken {
    from: usize,
    origin: SectionId,
    target: SectionId,
}

impl ResumeToken {
    /// The section the suspended transition was heading to.
    #[must_use]
    pub fn target(&self) -> &SectionId {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Viewing(usize),
    BlockedForward { index: usize, reason: BlockReason },
    AwaitingPreference(ResumeToken),
    ModuleComplete { index: usize },
}

/// Result of an "advance" trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    Blocked(BlockReason),
    NeedsPreference(ResumeToken),
    /// The last section was passed with every visible section complete.
    Completed,
}

/// Everything the gatekeeper consults for one decision.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub visible: &'a [&'a Section],
    pub ledger: &'a ProgressLedger,
    pub results: &'a BTreeMap<SectionId, AssessmentResult>,
    pub learner_styles: &'a BTreeSet<LearningStyle>,
    pub preference: AudioPreference,
}

impl GateContext<'_> {
    fn all_complete(&self) -> bool {
        self.ledger
            .is_fully_complete(self.visible.iter().map(|s| s.id()))
    }
}

//
// ─── GATEKEEPER ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationGatekeeper {
    state: GateState,
}

impl Default for NavigationGatekeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGatekeeper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: GateState::Viewing(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Index of the section currently on screen.
    #[must_use]
    pub fn index(&self) -> usize {
        match &self.state {
            GateState::Viewing(index)
            | GateState::BlockedForward { index, .. }
            | GateState::ModuleComplete { index } => *index,
            GateState::AwaitingPreference(token) => token.from,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, GateState::ModuleComplete { .. })
    }

    #[must_use]
    pub fn pending_prompt(&self) -> Option<&ResumeToken> {
        match &self.state {
            GateState::AwaitingPreference(token) => Some(token),
            _ => None,
        }
    }

    /// Applies the forward transition rules.
    pub fn advance(&mut self, ctx: &GateContext<'_>) -> Advance {
        if let GateState::ModuleComplete { .. } = self.state {
            return Advance::Completed;
        }
        if let GateState::AwaitingPreference(token) = &self.state {
            let token = token.clone();
            if ctx.preference.is_unset() {
                return Advance::NeedsPreference(token);
            }
            // A preference chosen elsewhere answers the prompt.
            if let Some(resumed) = self.resume(&token, ctx) {
                return resumed;
            }
        }

        let index = self.index();
        let Some(current) = ctx.visible.get(index) else {
            // Nothing left to view.
            return self.block(index, BlockReason::CompleteAllSections);
        };

        if current.is_assessment() && !ctx.results.contains_key(current.id()) {
            return self.block(index, BlockReason::SubmitAssessment);
        }
        if !ctx.ledger.is_complete(current.id()) {
            return self.block(index, BlockReason::CompleteSection);
        }

        let last = ctx.visible.len() - 1;
        if index >= last {
            if !ctx.all_complete() {
                return self.block(index, BlockReason::CompleteAllSections);
            }
            self.state = GateState::ModuleComplete { index: last };
            return Advance::Completed;
        }

        let next = ctx.visible[index + 1];
        if next.is_pre_test()
            && ctx.learner_styles.contains(&LearningStyle::Auditory)
            && ctx.preference.is_unset()
        {
            let token = ResumeToken {
                from: index,
                origin: current.id().clone(),
                target: next.id().clone(),
            };
            self.state = GateState::AwaitingPreference(token.clone());
            return Advance::NeedsPreference(token);
        }

        self.state = GateState::Viewing(index + 1);
        Advance::Moved {
            from: index,
            to: index + 1,
        }
    }

    /// Completes a transition suspended on the preference prompt.
    ///
    /// `ctx.visible` must already reflect the chosen preference; both ends of
    /// the reported move are positions in that list. Returns `None` if `token`
    /// does not match the pending prompt.
    pub fn resume(&mut self, token: &ResumeToken, ctx: &GateContext<'_>) -> Option<Advance> {
        if self.pending_prompt() != Some(token) {
            return None;
        }
        let position = |id: &SectionId| ctx.visible.iter().position(|s| s.id() == id);
        let last = ctx.visible.len().saturating_sub(1);
        let origin = position(&token.origin);
        let to = position(&token.target)
            .unwrap_or_else(|| origin.map_or(token.from, |i| i + 1).min(last));
        let from = origin.unwrap_or_else(|| to.saturating_sub(1));
        self.state = GateState::Viewing(to);
        Some(Advance::Moved { from, to })
    }

    /// Settles on `last` as a completed module.
    pub fn finish(&mut self, last: usize) {
        self.state = GateState::ModuleComplete { index: last };
    }

    /// Steps back one section, clamped at the first. Never blocked.
    pub fn retreat(&mut self) -> usize {
        let to = self.index().saturating_sub(1);
        self.state = GateState::Viewing(to);
        to
    }

    /// Points the gatekeeper at `index` after the visible list was rebuilt.
    ///
    /// Leaves a completed module complete.
    pub fn relocate(&mut self, index: usize) {
        self.state = match self.state {
            GateState::ModuleComplete { .. } => GateState::ModuleComplete { index },
            _ => GateState::Viewing(index),
        };
    }

    fn block(&mut self, index: usize, reason: BlockReason) -> Advance {
        self.state = GateState::BlockedForward { index, reason };
        Advance::Blocked(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaContent, QuestionSet, SectionContent, TextContent};
    use crate::scoring::score;

    struct Fixture {
        sections: Vec<Section>,
        ledger: ProgressLedger,
        results: BTreeMap<SectionId, AssessmentResult>,
        styles: BTreeSet<LearningStyle>,
        preference: AudioPreference,
    }

    impl Fixture {
        fn new(sections: Vec<Section>) -> Self {
            Self {
                sections,
                ledger: ProgressLedger::new(),
                results: BTreeMap::new(),
                styles: BTreeSet::new(),
                preference: AudioPreference::Unset,
            }
        }

        fn advance(&self, gate: &mut NavigationGatekeeper) -> Advance {
            let visible: Vec<&Section> = self.sections.iter().collect();
            gate.advance(&GateContext {
                visible: &visible,
                ledger: &self.ledger,
                results: &self.results,
                learner_styles: &self.styles,
                preference: self.preference,
            })
        }

        fn complete(&mut self, id: &str) {
            self.ledger.mark_complete(&SectionId::new(id));
        }
    }

    fn text(id: &str) -> Section {
        Section::new(id, id, SectionContent::Text(TextContent::default())).unwrap()
    }

    fn assessment(id: &str) -> Section {
        Section::new(id, id, SectionContent::Assessment(QuestionSet::default())).unwrap()
    }

    #[test]
    fn starts_viewing_first_section() {
        let gate = NavigationGatekeeper::new();
        assert_eq!(gate.state(), &GateState::Viewing(0));
    }

    #[test]
    fn incomplete_section_blocks() {
        let fx = Fixture::new(vec![text("a"), text("b")]);
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Blocked(BlockReason::CompleteSection));
        assert_eq!(
            gate.state(),
            &GateState::BlockedForward {
                index: 0,
                reason: BlockReason::CompleteSection
            }
        );
        assert_eq!(gate.index(), 0);
    }

    #[test]
    fn assessment_without_result_blocks_even_when_marked_complete() {
        let mut fx = Fixture::new(vec![assessment("quiz"), text("b")]);
        fx.complete("quiz");
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Blocked(BlockReason::SubmitAssessment));

        fx.results
            .insert(SectionId::new("quiz"), score(&[], &Default::default()));
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });
    }

    #[test]
    fn last_section_completes_module() {
        let mut fx = Fixture::new(vec![text("a"), text("b")]);
        fx.complete("a");
        fx.complete("b");
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });
        assert_eq!(fx.advance(&mut gate), Advance::Completed);
        assert!(gate.is_complete());
        assert_eq!(fx.advance(&mut gate), Advance::Completed);
    }

    #[test]
    fn last_section_blocks_while_earlier_sections_are_open() {
        let mut fx = Fixture::new(vec![text("a"), text("b")]);
        fx.complete("b");
        let mut gate = NavigationGatekeeper::new();
        gate.relocate(1);
        assert_eq!(
            fx.advance(&mut gate),
            Advance::Blocked(BlockReason::CompleteAllSections)
        );
    }

    #[test]
    fn auditory_learner_is_prompted_before_pre_test() {
        let mut fx = Fixture::new(vec![
            text("intro"),
            Section::new("listen", "Listen", SectionContent::Audio(MediaContent::default())).unwrap(),
            assessment("pre-test"),
        ]);
        fx.styles.insert(LearningStyle::Auditory);
        fx.complete("intro");
        fx.complete("listen");
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });

        let Advance::NeedsPreference(token) = fx.advance(&mut gate) else {
            panic!("expected preference prompt");
        };
        assert_eq!(token.target(), &SectionId::new("pre-test"));
        assert_eq!(gate.pending_prompt(), Some(&token));
        // Asking again re-surfaces the same prompt.
        assert_eq!(fx.advance(&mut gate), Advance::NeedsPreference(token.clone()));

        // Preference chosen: "listen" is hidden, the pre-test moves to index 1.
        let visible: Vec<&Section> = vec![&fx.sections[0], &fx.sections[2]];
        let ctx = GateContext {
            visible: &visible,
            ledger: &fx.ledger,
            results: &fx.results,
            learner_styles: &fx.styles,
            preference: AudioPreference::ReadAloud,
        };
        // "listen" is gone, so the move is reported from the section before the pre-test.
        assert_eq!(
            gate.resume(&token, &ctx),
            Some(Advance::Moved { from: 0, to: 1 })
        );
        assert_eq!(gate.state(), &GateState::Viewing(1));
        assert_eq!(gate.resume(&token, &ctx), None);
    }

    #[test]
    fn resume_reports_positions_in_filtered_list() {
        let mut fx = Fixture::new(vec![
            text("intro"),
            Section::new("listen", "Listen", SectionContent::Audio(MediaContent::default())).unwrap(),
            text("reading"),
            assessment("pre-test"),
        ]);
        fx.styles.insert(LearningStyle::Auditory);
        for id in ["intro", "listen", "reading"] {
            fx.complete(id);
        }
        let mut gate = NavigationGatekeeper::new();
        fx.advance(&mut gate);
        fx.advance(&mut gate);
        let Advance::NeedsPreference(token) = fx.advance(&mut gate) else {
            panic!("expected preference prompt");
        };

        let visible: Vec<&Section> = vec![&fx.sections[0], &fx.sections[2], &fx.sections[3]];
        let ctx = GateContext {
            visible: &visible,
            ledger: &fx.ledger,
            results: &fx.results,
            learner_styles: &fx.styles,
            preference: AudioPreference::ReadAloud,
        };
        assert_eq!(
            gate.resume(&token, &ctx),
            Some(Advance::Moved { from: 1, to: 2 })
        );
    }

    #[test]
    fn preference_set_elsewhere_releases_pending_prompt() {
        let mut fx = Fixture::new(vec![text("intro"), assessment("pre-test")]);
        fx.styles.insert(LearningStyle::Auditory);
        fx.complete("intro");
        let mut gate = NavigationGatekeeper::new();
        assert!(matches!(fx.advance(&mut gate), Advance::NeedsPreference(_)));

        fx.preference = AudioPreference::Audio;
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });
        assert_eq!(gate.state(), &GateState::Viewing(1));
        assert!(gate.pending_prompt().is_none());
    }

    #[test]
    fn finish_marks_module_complete() {
        let mut gate = NavigationGatekeeper::new();
        gate.finish(2);
        assert!(gate.is_complete());
        assert_eq!(gate.index(), 2);
    }

    #[test]
    fn no_prompt_once_preference_is_set_or_learner_not_auditory() {
        let mut fx = Fixture::new(vec![text("intro"), assessment("pre-test")]);
        fx.complete("intro");
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });

        fx.styles.insert(LearningStyle::Auditory);
        fx.preference = AudioPreference::Audio;
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(fx.advance(&mut gate), Advance::Moved { from: 0, to: 1 });
    }

    #[test]
    fn retreat_is_unconditional_and_clamped() {
        let mut gate = NavigationGatekeeper::new();
        assert_eq!(gate.retreat(), 0);
        gate.relocate(2);
        assert_eq!(gate.retreat(), 1);
        assert_eq!(gate.state(), &GateState::Viewing(1));
    }
}
