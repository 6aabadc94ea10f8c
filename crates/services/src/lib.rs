#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use lesson_core::Clock;
pub use sessions as session;

pub use error::{CompletionError, SessionError};

pub use sessions::{
    CompletionEvent, CompletionStatus, ModuleLoopService, ModuleProgress, ModuleSession,
    NoopObserver, ProgressObserver, Step, SubmitOutcome,
};
