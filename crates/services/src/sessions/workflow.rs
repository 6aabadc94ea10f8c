use std::sync::Arc;

use lesson_core::gatekeeper::{Advance, ResumeToken};
use lesson_core::model::{
    AssessmentResult, AudioPreference, CompletionRecord, LearningStyle, Module, ModuleId,
    ScoringPolicy, SectionId, StudentId,
};
use storage::repository::{
    BadgeAward, BadgeRepository, CompletionRepository, Storage, SubmissionRepository,
    SubmissionStatus,
};
use tracing::{error, info, warn};

use super::observer::{NoopObserver, ProgressObserver};
use super::progress::{CompletionEvent, CompletionStatus};
use super::service::ModuleSession;
use crate::Clock;
use crate::error::{CompletionError, SessionError};

/// Result of submitting an assessed section.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub result: AssessmentResult,
    /// Whether the submission collaborator accepted the record.
    pub saved: bool,
    pub completion: Option<CompletionEvent>,
}

/// Result of a navigation trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub advance: Advance,
    pub completion: Option<CompletionEvent>,
}

/// Orchestrates a module session against the persistence collaborators.
///
/// Local state always moves first. Submission and draft failures are logged
/// and reported to the observer; only a failed completion save is an error.
#[derive(Clone)]
pub struct ModuleLoopService {
    clock: Clock,
    policy: ScoringPolicy,
    submissions: Arc<dyn SubmissionRepository>,
    completions: Arc<dyn CompletionRepository>,
    badges: Arc<dyn BadgeRepository>,
    observer: Arc<dyn ProgressObserver>,
}

impl ModuleLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        submissions: Arc<dyn SubmissionRepository>,
        completions: Arc<dyn CompletionRepository>,
        badges: Arc<dyn BadgeRepository>,
    ) -> Self {
        Self {
            clock,
            policy: ScoringPolicy::standard(),
            submissions,
            completions,
            badges,
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.submissions),
            Arc::clone(&storage.completions),
            Arc::clone(&storage.badges),
        )
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Start a new session for `student_id` on `module`.
    #[must_use]
    pub fn start_session(
        &self,
        student_id: StudentId,
        module: Module,
        learner_styles: impl IntoIterator<Item = LearningStyle>,
    ) -> ModuleSession {
        let session = ModuleSession::new(
            student_id,
            module,
            learner_styles,
            self.policy,
            self.clock.now(),
        );
        info!(
            session = %session.id(),
            module = %session.module().id(),
            sections = session.module().sections().len(),
            "module session started"
        );
        session
    }

    /// Submit an assessed section and persist it as `submitted`.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`ModuleSession::submit_section`], and
    /// `SessionError::Completion` if this submit finished the module and the
    /// completion record could not be stored.
    pub async fn submit_assessment(
        &self,
        session: &mut ModuleSession,
        section_id: &SectionId,
    ) -> Result<SubmitOutcome, SessionError> {
        let now = self.clock.now();
        let was_complete = session.ledger().is_complete(section_id);
        let result = session.submit_section(section_id, now)?;
        if !was_complete {
            self.observer.section_completed(section_id);
        }

        let record = session.submission_for(section_id, SubmissionStatus::Submitted, now)?;
        let saved = match self.submissions.save_submission(&record).await {
            Ok(_) => true,
            Err(err) => {
                warn!(section = %section_id, error = %err, "submission save failed; keeping local result");
                self.observer.draft_save_failed(section_id, &err);
                false
            }
        };

        let completion = self.check_completion(session).await?;
        Ok(SubmitOutcome {
            result,
            saved,
            completion,
        })
    }

    /// Persist in-progress answers for `section_id` with status `draft`.
    ///
    /// Returns whether the collaborator accepted the draft.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` if the module has no such section.
    pub async fn save_draft(
        &self,
        session: &ModuleSession,
        section_id: &SectionId,
    ) -> Result<bool, SessionError> {
        let record = session.submission_for(section_id, SubmissionStatus::Draft, self.clock.now())?;
        match self.submissions.save_submission(&record).await {
            Ok(_) => Ok(true),
            Err(err) => {
                warn!(section = %section_id, error = %err, "draft save failed");
                self.observer.draft_save_failed(section_id, &err);
                Ok(false)
            }
        }
    }

    /// Mark a non-assessed section complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSection` for unknown sections,
    /// `SessionError::SubmissionRequired` for assessments and
    /// `SessionError::Completion` if completing the module failed to persist.
    pub async fn mark_section_complete(
        &self,
        session: &mut ModuleSession,
        section_id: &SectionId,
    ) -> Result<Option<CompletionEvent>, SessionError> {
        if session.mark_section_complete(section_id)? {
            self.observer.section_completed(section_id);
        }
        self.check_completion(session).await
    }

    /// Attempt to move forward one section.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completion` if the move finished the module and
    /// the completion record could not be stored.
    pub async fn advance(&self, session: &mut ModuleSession) -> Result<Step, SessionError> {
        let advance = session.advance(self.clock.now());
        if let Advance::Blocked(reason) = &advance {
            self.observer.navigation_blocked(*reason);
        }
        let completion = self.check_completion(session).await?;
        Ok(Step {
            advance,
            completion,
        })
    }

    /// Answer the pending preference prompt and finish the suspended move.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidResumeToken` or a preference error when
    /// the choice is rejected, and `SessionError::Completion` if the
    /// auto-completed sections finished the module and persisting failed.
    pub async fn resume_with_preference(
        &self,
        session: &mut ModuleSession,
        token: &ResumeToken,
        choice: AudioPreference,
    ) -> Result<Step, SessionError> {
        let (advance, newly) = session.resume_with_preference(token, choice, self.clock.now())?;
        for id in &newly {
            self.observer.section_completed(id);
        }
        let completion = self.check_completion(session).await?;
        Ok(Step {
            advance,
            completion,
        })
    }

    /// Apply an audio preference. A pending prompt is answered by it.
    ///
    /// # Errors
    ///
    /// Returns preference errors from [`ModuleSession::choose_audio_preference`]
    /// and `SessionError::Completion` if persisting a completion failed.
    pub async fn choose_audio_preference(
        &self,
        session: &mut ModuleSession,
        choice: AudioPreference,
    ) -> Result<Option<CompletionEvent>, SessionError> {
        let newly = session.choose_audio_preference(choice, self.clock.now())?;
        for id in &newly {
            self.observer.section_completed(id);
        }
        self.check_completion(session).await
    }

    /// Step back one section. Never blocked.
    pub fn retreat(&self, session: &mut ModuleSession) -> usize {
        session.retreat(self.clock.now())
    }

    /// Fire and persist the completion once the learner is on the last visible
    /// section and the visible set is fully complete.
    ///
    /// Safe to call repeatedly; the evaluator fires at most once per session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completion` if the completion record could not
    /// be stored. The guard stays set; use
    /// [`ModuleLoopService::retry_completion`] to try again.
    pub async fn check_completion(
        &self,
        session: &mut ModuleSession,
    ) -> Result<Option<CompletionEvent>, SessionError> {
        let now = self.clock.now();
        let Some(record) = session.check_completion(now) else {
            return Ok(None);
        };

        for submission in session.submission_records(now) {
            if let Err(err) = self.submissions.save_submission(&submission).await {
                warn!(
                    section = %submission.section_id,
                    error = %err,
                    "submission save failed during completion"
                );
                self.observer.draft_save_failed(&submission.section_id, &err);
            }
        }

        self.persist_completion(session, record).await.map(Some)
    }

    /// Re-attempt storing a completion whose save failed.
    ///
    /// An already stored completion is returned as is.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::NotReady` if completion never fired and
    /// `CompletionError::Persist` if the save fails again.
    pub async fn retry_completion(
        &self,
        session: &mut ModuleSession,
    ) -> Result<CompletionEvent, SessionError> {
        let record = match session.completion_status() {
            CompletionStatus::NotFired => return Err(CompletionError::NotReady.into()),
            CompletionStatus::Persisted {
                record,
                badge_awarded,
            } => {
                return Ok(CompletionEvent {
                    record: record.clone(),
                    badge_awarded: *badge_awarded,
                });
            }
            CompletionStatus::Pending(record) => record.clone(),
        };
        info!(module = %record.module_id, "retrying completion");
        self.persist_completion(session, record).await
    }

    /// Most recent stored completion of `module_id` by `student_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on read failures.
    pub async fn previous_completion(
        &self,
        student_id: &StudentId,
        module_id: &ModuleId,
    ) -> Result<Option<CompletionRecord>, SessionError> {
        Ok(self.completions.latest_completion(student_id, module_id).await?)
    }

    async fn persist_completion(
        &self,
        session: &mut ModuleSession,
        record: CompletionRecord,
    ) -> Result<CompletionEvent, SessionError> {
        if let Err(err) = self.completions.save_completion(&record).await {
            error!(
                module = %record.module_id,
                student = %record.student_id,
                error = %err,
                "completion save failed; badge not assigned"
            );
            self.observer.completion_failed(&err);
            return Err(CompletionError::Persist(err).into());
        }

        let award = BadgeAward::for_completion(&record, self.clock.now());
        let badge_awarded = match self.badges.award_badge(&award).await {
            Ok(()) => true,
            Err(err) => {
                warn!(badge = award.badge_type.as_str(), error = %err, "badge award failed");
                false
            }
        };

        session.mark_completion_persisted(badge_awarded);
        let event = CompletionEvent {
            record,
            badge_awarded,
        };
        info!(
            module = %event.record.module_id,
            final_score = event.record.final_score,
            badge = event.badge_tier().as_str(),
            badge_awarded,
            "module completed"
        );
        self.observer.module_completed(&event);
        Ok(event)
    }
}
