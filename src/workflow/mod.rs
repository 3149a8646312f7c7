pub mod engagement;
pub mod forum;
pub mod orchestrator;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{report, Orchestrator};
pub use types::{AggregateFailure, Stage, StageFailure, WorkflowOutcome};
