//! Job orchestration engine
//!
//! A flow is one multi-step job procedure written as a plain `async` block.
//! Each step awaits one asynchronous operation (an external process or a
//! player command) and the procedure only resumes once that operation has
//! reported back, so steps run strictly in program order. Flows are spawned
//! on the ambient tokio runtime; the binary runs a `current_thread` runtime,
//! which keeps every step on the host's single event-loop thread.

use std::fmt;

use crate::domain::errors::ClipError;

pub mod flow;
pub mod job;

pub use flow::{FlowContext, FlowDriver};
pub use job::{JobHandle, JobId, JobSlot, JobTicket};

/// How a flow ended
#[derive(Debug)]
pub enum FlowOutcome<T> {
    /// Every step ran and the procedure returned a value
    Completed(T),
    /// A step failed; later steps did not run
    Failed(ClipError),
    /// The flow was cancelled through its job handle
    Cancelled,
}

impl<T> FlowOutcome<T> {
    /// Fold a procedure result into an outcome.
    ///
    /// Errors observed after cancellation was requested count as
    /// cancellation, since they are usually the unwinding itself.
    pub fn from_result(result: Result<T, ClipError>, cancel_requested: bool) -> Self {
        match result {
            Ok(value) => FlowOutcome::Completed(value),
            Err(ClipError::Cancelled) => FlowOutcome::Cancelled,
            Err(_) if cancel_requested => FlowOutcome::Cancelled,
            Err(err) => FlowOutcome::Failed(err),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, FlowOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FlowOutcome::Cancelled)
    }

    /// Convert back into a `Result`, cancellation becoming [`ClipError::Cancelled`]
    pub fn into_result(self) -> Result<T, ClipError> {
        match self {
            FlowOutcome::Completed(value) => Ok(value),
            FlowOutcome::Failed(err) => Err(err),
            FlowOutcome::Cancelled => Err(ClipError::Cancelled),
        }
    }
}

impl<T> fmt::Display for FlowOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowOutcome::Completed(_) => f.write_str("completed"),
            FlowOutcome::Failed(err) => write!(f, "failed: {}", err),
            FlowOutcome::Cancelled => f.write_str("cancelled"),
        }
    }
}
