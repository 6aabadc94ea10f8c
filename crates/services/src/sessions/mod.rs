mod observer;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use observer::{NoopObserver, ProgressObserver};
pub use progress::{CompletionEvent, CompletionStatus, ModuleProgress};
pub use service::ModuleSession;
pub use workflow::{ModuleLoopService, Step, SubmitOutcome};
