//! Cooperative flow driver

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::ClipError;
use crate::domain::model::{ProcessResult, ProcessSpec, ProcessStatus};
use crate::engine::job::{JobHandle, JobId, JobTicket};
use crate::engine::FlowOutcome;
use crate::ports::ProcessRunner;

/// Starts flows and hands each one a [`FlowContext`]
#[derive(Clone)]
pub struct FlowDriver {
    runner: Arc<dyn ProcessRunner>,
    next_id: Arc<AtomicU64>,
}

impl FlowDriver {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin executing `procedure` and return a handle to the new flow.
    ///
    /// The procedure starts running at the runtime's next scheduling point;
    /// `start` itself never waits on it.
    pub fn start<T, F, Fut>(&self, procedure: F) -> JobHandle<T>
    where
        F: FnOnce(FlowContext) -> Fut,
        Fut: Future<Output = Result<T, ClipError>> + Send + 'static,
        T: Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        let context = FlowContext {
            id,
            runner: Arc::clone(&self.runner),
            cancel: cancel.clone(),
        };

        let steps = procedure(context);
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            info!(job = id, "flow started");
            let outcome = FlowOutcome::from_result(steps.await, token.is_cancelled());
            match &outcome {
                FlowOutcome::Completed(_) => info!(job = id, "flow completed"),
                FlowOutcome::Cancelled => info!(job = id, "flow cancelled"),
                FlowOutcome::Failed(err) => warn!(job = id, error = %err, "flow failed"),
            }
            outcome
        });

        JobHandle::new(JobTicket::new(id, cancel), join)
    }
}

/// What a running procedure uses to issue its steps
#[derive(Clone)]
pub struct FlowContext {
    id: JobId,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancellationToken,
}

impl FlowContext {
    pub fn job_id(&self) -> JobId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`ClipError::Cancelled`] once cancellation was requested
    pub fn checkpoint(&self) -> Result<(), ClipError> {
        if self.cancel.is_cancelled() {
            Err(ClipError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Launch `spec` and suspend until it ends.
    ///
    /// The process is aborted when the flow is cancelled. A result that
    /// arrives after cancellation is discarded so the procedure cannot resume.
    pub async fn run(&self, spec: ProcessSpec) -> Result<ProcessResult, ClipError> {
        self.checkpoint()?;
        debug!(job = self.id, command = %spec, "launching process");

        let handle = self.runner.run(spec, self.cancel.child_token());
        let result = handle.wait().await;

        if result.status == ProcessStatus::Aborted || self.cancel.is_cancelled() {
            debug!(job = self.id, program = %result.program, "process ended by cancellation");
            return Err(ClipError::Cancelled);
        }
        debug!(job = self.id, program = %result.program, status = %result.status, "process finished");
        Ok(result)
    }

    /// [`run`](Self::run) followed by `classify` on the result
    pub async fn run_checked<R>(
        &self,
        spec: ProcessSpec,
        classify: impl FnOnce(&ProcessResult) -> Result<R, ClipError>,
    ) -> Result<R, ClipError> {
        let result = self.run(spec).await?;
        classify(&result)
    }

    /// Suspend on an operation that is not a process, racing cancellation.
    ///
    /// On cancellation the operation future is dropped.
    pub async fn suspend<T, F>(&self, operation: F) -> Result<T, ClipError>
    where
        F: Future<Output = Result<T, ClipError>>,
    {
        self.checkpoint()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClipError::Cancelled),
            result = operation => {
                self.checkpoint()?;
                result
            }
        }
    }
}
