//! Pipeline orchestrator.
//!
//! Owns the pending-task queue and the single active task, and drives each
//! task through fetch, transcode and publish. Control-plane operations
//! (enqueue, cancel, skip, clear, status) go through the non-generic
//! [`OrchestratorHandle`] so source adapters and the command surface never
//! need to know the concrete stage runner types.

mod config;
mod handle;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use handle::OrchestratorHandle;
pub use runner::Orchestrator;
pub use types::{ActiveTask, CompletedTask, EnqueueError, OrchestratorStatus, StageFailure};
