use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lesson_core::badge::{self, ScoredSection};
use lesson_core::catalog;
use lesson_core::gatekeeper::{Advance, GateContext, GateState, NavigationGatekeeper, ResumeToken};
use lesson_core::ledger::ProgressLedger;
use lesson_core::model::{
    AssessmentResult, AudioPreference, CompletionRecord, LearningStyle, Module, PreferenceError,
    RawAnswer, ScoringPolicy, Section, SectionAnswers, SectionId, SessionId, StudentId,
};
use lesson_core::scoring::{Scorer, unanswered_required};
use lesson_core::time::{minutes_between, seconds_between};
use storage::repository::{SubmissionRecord, SubmissionStatus};
use tracing::debug;

use super::progress::{CompletionStatus, ModuleProgress};
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one learner viewing one module.
///
/// Owns the ledger, answers, results, audio preference, navigation state and
/// the fire-once completion guard. Nothing is shared between sessions.
/// Operations take `now` from the services layer clock so time stays
/// deterministic.
pub struct ModuleSession {
    id: SessionId,
    student_id: StudentId,
    module: Module,
    learner_styles: BTreeSet<LearningStyle>,
    scorer: Scorer,
    preference: AudioPreference,
    ledger: ProgressLedger,
    answers: BTreeMap<SectionId, SectionAnswers>,
    results: BTreeMap<SectionId, AssessmentResult>,
    gate: NavigationGatekeeper,
    started_at: DateTime<Utc>,
    entered_at: DateTime<Utc>,
    dwell_seconds: BTreeMap<SectionId, u32>,
    completion: CompletionStatus,
}

impl ModuleSession {
    #[must_use]
    pub fn new(
        student_id: StudentId,
        module: Module,
        learner_styles: impl IntoIterator<Item = LearningStyle>,
        policy: ScoringPolicy,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            student_id,
            module,
            learner_styles: learner_styles.into_iter().collect(),
            scorer: Scorer::new(policy),
            preference: AudioPreference::Unset,
            ledger: ProgressLedger::new(),
            answers: BTreeMap::new(),
            results: BTreeMap::new(),
            gate: NavigationGatekeeper::new(),
            started_at,
            entered_at: started_at,
            dwell_seconds: BTreeMap::new(),
            completion: CompletionStatus::NotFired,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[must_use]
    pub fn learner_styles(&self) -> &BTreeSet<LearningStyle> {
        &self.learner_styles
    }

    #[must_use]
    pub fn preference(&self) -> AudioPreference {
        self.preference
    }

    #[must_use]
    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn gate_state(&self) -> &GateState {
        self.gate.state()
    }

    #[must_use]
    pub fn pending_prompt(&self) -> Option<&ResumeToken> {
        self.gate.pending_prompt()
    }

    #[must_use]
    pub fn completion_status(&self) -> &CompletionStatus {
        &self.completion
    }

    #[must_use]
    pub fn result(&self, section_id: &SectionId) -> Option<&AssessmentResult> {
        self.results.get(section_id)
    }

    #[must_use]
    pub fn answers(&self, section_id: &SectionId) -> Option<&SectionAnswers> {
        self.answers.get(section_id)
    }

    /// Seconds accumulated on `section_id` up to the last navigation or submit.
    #[must_use]
    pub fn time_spent_seconds(&self, section_id: &SectionId) -> u32 {
        self.dwell_seconds.get(section_id).copied().unwrap_or(0)
    }

    /// Sections left to navigate under the current preference, in module order.
    #[must_use]
    pub fn visible_sections(&self) -> Vec<&Section> {
        catalog::visible_sections(self.module.sections(), self.preference)
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.visible_sections().get(self.gate.index()).copied()
    }

    /// Returns a summary of the current module progress.
    #[must_use]
    pub fn progress(&self) -> ModuleProgress {
        let visible = self.visible_sections();
        let ids = visible.iter().map(|s| s.id());
        let current_index = self.gate.index();
        ModuleProgress {
            total_sections: visible.len(),
            completed_sections: self.ledger.completed_count(ids.clone()),
            percentage: self.ledger.completion_percentage(ids),
            current_index,
            current_section: visible.get(current_index).map(|s| s.id().clone()),
            preference: self.preference,
            is_complete: self.gate.is_complete() || self.completion.has_fired(),
        }
    }

    //
    // ─── ANSWERS & SUBMISSION ──────────────────────────────────────────────────
    //

    /// Stores the learner's raw answer for question `index` of `section_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` if the module has no such section.
    pub fn record_answer(
        &mut self,
        section_id: &SectionId,
        index: usize,
        answer: RawAnswer,
    ) -> Result<(), SessionError> {
        self.section(section_id)?;
        self.answers
            .entry(section_id.clone())
            .or_default()
            .insert(index, answer);
        Ok(())
    }

    /// Scores the section's answers, records the result and marks it complete.
    ///
    /// The section counts as complete whether or not the learner passed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` or `SessionError::NotScorable`
    /// for sections without questions, and `SessionError::Unanswered` when
    /// required questions have no usable answer. Errors leave the session
    /// untouched.
    pub fn submit_section(
        &mut self,
        section_id: &SectionId,
        now: DateTime<Utc>,
    ) -> Result<AssessmentResult, SessionError> {
        let section = self.section(section_id)?;
        let questions = self
            .module
            .questions_for(section)
            .ok_or_else(|| SessionError::NotScorable(section_id.clone()))?;
        let empty = SectionAnswers::new();
        let answers = self.answers.get(section_id).unwrap_or(&empty);

        let indexes = unanswered_required(questions, answers);
        if !indexes.is_empty() {
            return Err(SessionError::Unanswered {
                section: section_id.clone(),
                indexes,
            });
        }

        let result = self.scorer.score(questions, answers);
        debug!(
            section = %section_id,
            percentage = result.percentage,
            passed = result.passed,
            "section submitted"
        );

        self.settle_dwell(now);
        self.results.insert(section_id.clone(), result.clone());
        self.ledger.mark_complete(section_id);
        Ok(result)
    }

    /// Marks a non-assessed section complete. Returns `true` if it was not
    /// complete before.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` if the module has no such section
    /// and `SessionError::SubmissionRequired` for assessment sections, which
    /// only complete through [`ModuleSession::submit_section`].
    pub fn mark_section_complete(&mut self, section_id: &SectionId) -> Result<bool, SessionError> {
        if self.section(section_id)?.is_assessment() {
            return Err(SessionError::SubmissionRequired(section_id.clone()));
        }
        let newly = self.ledger.mark_complete(section_id);
        if newly {
            debug!(section = %section_id, "section completed");
        }
        Ok(newly)
    }

    /// Snapshot of `section_id` shaped for the submission collaborator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` if the module has no such section.
    pub fn submission_for(
        &self,
        section_id: &SectionId,
        status: SubmissionStatus,
        now: DateTime<Utc>,
    ) -> Result<SubmissionRecord, SessionError> {
        let section = self.section(section_id)?;
        Ok(self.submission_record(section, status, now))
    }

    /// One submitted record per visible section, in module order.
    #[must_use]
    pub fn submission_records(&self, now: DateTime<Utc>) -> Vec<SubmissionRecord> {
        self.visible_sections()
            .into_iter()
            .map(|section| self.submission_record(section, SubmissionStatus::Submitted, now))
            .collect()
    }

    fn submission_record(
        &self,
        section: &Section,
        status: SubmissionStatus,
        now: DateTime<Utc>,
    ) -> SubmissionRecord {
        SubmissionRecord {
            student_id: self.student_id.clone(),
            module_id: self.module.id().clone(),
            section_id: section.id().clone(),
            section_title: section.title().to_owned(),
            section_type: section.content_type(),
            answers: self.answers.get(section.id()).cloned().unwrap_or_default(),
            submitted_at: now,
            result: self.results.get(section.id()).cloned(),
            time_spent_seconds: self.time_spent_seconds(section.id()),
            status,
        }
    }

    //
    // ─── PREFERENCE ────────────────────────────────────────────────────────────
    //

    /// Applies the one-time audio preference.
    ///
    /// Sections made redundant by the choice are marked complete and the
    /// current position is kept on the same section when it stays visible.
    /// A pending preference prompt is answered by the choice, completing the
    /// suspended move. Returns the sections newly completed this way.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError::AlreadyChosen` when a preference is already
    /// set and `PreferenceError::UnsetChoice` when `choice` is `Unset`.
    pub fn choose_audio_preference(
        &mut self,
        choice: AudioPreference,
        now: DateTime<Utc>,
    ) -> Result<Vec<SectionId>, SessionError> {
        let pending = self.gate.pending_prompt().cloned();
        let newly = self.apply_preference(choice, now)?;
        if let Some(token) = pending {
            let outcome = self.resume_gate(&token);
            debug!(?outcome, target = %token.target(), "pending prompt answered directly");
        }
        Ok(newly)
    }

    fn apply_preference(
        &mut self,
        choice: AudioPreference,
        now: DateTime<Utc>,
    ) -> Result<Vec<SectionId>, SessionError> {
        if !self.preference.is_unset() {
            return Err(PreferenceError::AlreadyChosen.into());
        }
        if choice.is_unset() {
            return Err(PreferenceError::UnsetChoice.into());
        }

        self.settle_dwell(now);
        let current = self.current_section().map(|s| s.id().clone());
        self.preference = choice;

        let mut newly = Vec::new();
        for id in catalog::auto_completed_ids(self.module.sections(), choice) {
            if self.ledger.mark_complete(&id) {
                newly.push(id);
            }
        }

        if self.gate.pending_prompt().is_none() {
            let visible = catalog::visible_sections(self.module.sections(), choice);
            let fallback = self.gate.index().min(visible.len().saturating_sub(1));
            let index = current
                .and_then(|id| visible.iter().position(|s| s.id() == &id))
                .unwrap_or(fallback);
            self.gate.relocate(index);
        }

        debug!(
            preference = choice.as_str(),
            auto_completed = newly.len(),
            "audio preference chosen"
        );
        Ok(newly)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Attempts to move forward one section.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Advance {
        self.settle_dwell(now);
        let visible = catalog::visible_sections(self.module.sections(), self.preference);
        let ctx = GateContext {
            visible: &visible,
            ledger: &self.ledger,
            results: &self.results,
            learner_styles: &self.learner_styles,
            preference: self.preference,
        };
        let outcome = self.gate.advance(&ctx);
        debug!(?outcome, "advance");
        outcome
    }

    /// Answers a pending preference prompt and completes the suspended move.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidResumeToken` if `token` is not the
    /// pending prompt, and preference errors from
    /// [`ModuleSession::choose_audio_preference`].
    pub fn resume_with_preference(
        &mut self,
        token: &ResumeToken,
        choice: AudioPreference,
        now: DateTime<Utc>,
    ) -> Result<(Advance, Vec<SectionId>), SessionError> {
        if self.gate.pending_prompt() != Some(token) {
            return Err(SessionError::InvalidResumeToken);
        }
        let newly = self.apply_preference(choice, now)?;
        let outcome = self
            .resume_gate(token)
            .ok_or(SessionError::InvalidResumeToken)?;
        debug!(?outcome, target = %token.target(), "resumed after preference prompt");
        Ok((outcome, newly))
    }

    fn resume_gate(&mut self, token: &ResumeToken) -> Option<Advance> {
        let visible = catalog::visible_sections(self.module.sections(), self.preference);
        let ctx = GateContext {
            visible: &visible,
            ledger: &self.ledger,
            results: &self.results,
            learner_styles: &self.learner_styles,
            preference: self.preference,
        };
        self.gate.resume(token, &ctx)
    }

    /// Steps back one section. Never blocked.
    pub fn retreat(&mut self, now: DateTime<Utc>) -> usize {
        self.settle_dwell(now);
        let index = self.gate.retreat();
        debug!(index, "retreat");
        index
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// Fires the completion evaluator when the learner is on the last visible
    /// section, every visible section is complete and every visible
    /// assessment has a result. The navigation state settles on the module
    /// being complete.
    ///
    /// Returns the record the first time only; later calls return `None`
    /// whatever the outcome of persisting it.
    pub fn check_completion(&mut self, now: DateTime<Utc>) -> Option<CompletionRecord> {
        if self.completion.has_fired() {
            return None;
        }
        let visible = catalog::visible_sections(self.module.sections(), self.preference);
        let last = visible.len().checked_sub(1)?;
        let ready = self.gate.pending_prompt().is_none()
            && self.gate.index() >= last
            && self.ledger.is_fully_complete(visible.iter().map(|s| s.id()))
            && visible
                .iter()
                .filter(|s| s.is_assessment())
                .all(|s| self.results.contains_key(s.id()));
        if !ready {
            return None;
        }

        self.settle_dwell(now);
        self.gate.finish(last);
        let record = self.build_completion_record(now);
        debug!(final_score = record.final_score, "completion fired");
        self.completion = CompletionStatus::Pending(record.clone());
        Some(record)
    }

    /// Evaluates the module outcome as of `now` without touching the guard.
    #[must_use]
    pub fn build_completion_record(&self, now: DateTime<Utc>) -> CompletionRecord {
        let scored: Vec<ScoredSection<'_>> = self
            .module
            .sections()
            .iter()
            .filter_map(|section| {
                self.results.get(section.id()).map(|result| ScoredSection {
                    is_pre_test: section.is_pre_test(),
                    is_post_test: section.is_post_test(),
                    result,
                })
            })
            .collect();
        let outcome = badge::evaluate(&scored, self.scorer.policy());

        let visible = self.visible_sections();
        let completed = self.ledger.completed_count(visible.iter().map(|s| s.id()));

        CompletionRecord {
            student_id: self.student_id.clone(),
            module_id: self.module.id().clone(),
            final_score: outcome.final_score,
            time_spent_minutes: minutes_between(self.started_at, now),
            pre_test_score: outcome.pre_test_score,
            post_test_score: outcome.post_test_score,
            sections_completed: u32::try_from(completed).unwrap_or(u32::MAX),
            total_sections: u32::try_from(visible.len()).unwrap_or(u32::MAX),
            perfect_sections: outcome.perfect_sections,
            badge_tier: outcome.badge_tier,
            completed_at: now,
        }
    }

    pub(crate) fn mark_completion_persisted(&mut self, badge_awarded: bool) {
        if let Some(record) = self.completion.record() {
            self.completion = CompletionStatus::Persisted {
                record: record.clone(),
                badge_awarded,
            };
        }
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn section(&self, section_id: &SectionId) -> Result<&Section, SessionError> {
        self.module
            .section(section_id)
            .ok_or_else(|| SessionError::UnknownSection(section_id.clone()))
    }

    /// Credits the time since the last checkpoint to the section on screen.
    fn settle_dwell(&mut self, now: DateTime<Utc>) {
        let elapsed = seconds_between(self.entered_at, now);
        if let Some(id) = self.current_section().map(|s| s.id().clone()) {
            let total = self.dwell_seconds.entry(id).or_insert(0);
            *total = total.saturating_add(elapsed);
        }
        self.entered_at = now;
    }
}
