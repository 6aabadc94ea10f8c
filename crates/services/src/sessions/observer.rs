use lesson_core::gatekeeper::BlockReason;
use lesson_core::model::SectionId;
use storage::repository::StorageError;

use super::progress::CompletionEvent;

/// Callbacks for a host that renders session progress.
///
/// Every method defaults to a no-op.
pub trait ProgressObserver: Send + Sync {
    fn section_completed(&self, _section_id: &SectionId) {}

    fn navigation_blocked(&self, _reason: BlockReason) {}

    /// A draft or submission save failed; local progress was kept.
    fn draft_save_failed(&self, _section_id: &SectionId, _error: &StorageError) {}

    fn completion_failed(&self, _error: &StorageError) {}

    fn module_completed(&self, _event: &CompletionEvent) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
