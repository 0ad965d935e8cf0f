//! Job handles and the shared "current job" slot

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::ClipError;
use crate::engine::FlowOutcome;

/// Identifier of one started flow
pub type JobId = u64;

/// Clonable reference to a flow, enough to cancel it
#[derive(Debug, Clone)]
pub struct JobTicket {
    id: JobId,
    cancel: CancellationToken,
}

impl JobTicket {
    pub(crate) fn new(id: JobId, cancel: CancellationToken) -> Self {
        Self { id, cancel }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Signal cancellation; the flow terminates its awaited process and unwinds
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owning handle of a started flow
#[derive(Debug)]
pub struct JobHandle<T> {
    ticket: JobTicket,
    join: JoinHandle<FlowOutcome<T>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(ticket: JobTicket, join: JoinHandle<FlowOutcome<T>>) -> Self {
        Self { ticket, join }
    }

    pub fn id(&self) -> JobId {
        self.ticket.id
    }

    /// Clonable part of the handle
    pub fn ticket(&self) -> JobTicket {
        self.ticket.clone()
    }

    pub fn cancel(&self) {
        self.ticket.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Suspend until the flow has ended
    pub async fn wait(self) -> FlowOutcome<T> {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => FlowOutcome::Cancelled,
            Err(err) => FlowOutcome::Failed(ClipError::Internal(format!(
                "job {} panicked: {}",
                self.ticket.id, err
            ))),
        }
    }
}

/// Slot holding the job that `kill` acts on
///
/// At most one ticket is current. Starting a job overwrites the slot without
/// stopping whatever was there before: an older flow keeps running and can no
/// longer be reached through the slot. Only an explicit `kill` cancels.
#[derive(Debug, Clone, Default)]
pub struct JobSlot {
    current: Arc<Mutex<Option<JobTicket>>>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<JobTicket>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `ticket` current and return the ticket it displaced
    pub fn replace(&self, ticket: JobTicket) -> Option<JobTicket> {
        let previous = self.lock().replace(ticket);
        if let Some(previous) = &previous {
            debug!(job = previous.id, "job slot overwritten; previous job keeps running");
        }
        previous
    }

    pub fn current(&self) -> Option<JobTicket> {
        self.lock().clone()
    }

    /// Cancel the current job. Returns false when the slot is empty.
    pub fn kill(&self) -> bool {
        match self.lock().as_ref() {
            Some(ticket) => {
                info!(job = ticket.id, "cancelling current job");
                ticket.cancel();
                true
            }
            None => {
                debug!("kill requested with no current job");
                false
            }
        }
    }

    /// Empty the slot if it still holds job `id`
    pub fn clear_if(&self, id: JobId) -> bool {
        let mut current = self.lock();
        if current.as_ref().map(JobTicket::id) == Some(id) {
            *current = None;
            true
        } else {
            false
        }
    }
}
