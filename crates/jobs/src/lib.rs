//! Job orchestration for the hark transcription service.
//!
//! The [`Orchestrator`] owns every lifecycle transition. Work reaches the
//! transcription workers through the [`dispatcher`]'s bounded queue, with a
//! fresh execution token minted per dispatch so stale attempts cannot write.
//! [`progress`] persists fire-and-forget progress reports off the hot path,
//! and the [`Watchdog`] reaps processing attempts that outlive the job
//! timeout.

pub mod dispatcher;
pub mod orchestrator;
pub mod progress;
pub mod settings;
pub mod watchdog;

pub use dispatcher::{dispatch_channel, DispatchError, DispatchHandle, DispatchQueue, Dispatcher};
pub use orchestrator::{Orchestrator, OrchestratorError, SubmitRequest};
pub use progress::ProgressReporter;
pub use settings::JobSettings;
pub use watchdog::Watchdog;
