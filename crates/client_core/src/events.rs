use shared::{domain::Homework, scoring::EvaluationResult};
use tokio::task::JoinHandle;

use crate::error::ClientError;

/// Identifies one async operation. A completion is applied only while its
/// ticket is still the one the controller is waiting on.
pub type Ticket = u64;

/// Background task owned by the controller. Dropping it aborts the task, so
/// replacing or clearing the slot that holds it cancels the work.
pub(crate) struct PendingTask {
    ticket: Ticket,
    handle: JoinHandle<()>,
}

impl PendingTask {
    pub(crate) fn new(ticket: Ticket, handle: JoinHandle<()>) -> Self {
        Self { ticket, handle }
    }

    pub(crate) fn ticket(&self) -> Ticket {
        self.ticket
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub(crate) fn is_current(slot: &Option<PendingTask>, ticket: Ticket) -> bool {
    slot.as_ref().is_some_and(|task| task.ticket() == ticket)
}

#[derive(Debug)]
pub enum ControllerEvent {
    DraftReady {
        ticket: Ticket,
        homework: Homework,
    },
    EvaluationFinished {
        ticket: Ticket,
        result: Result<EvaluationResult, ClientError>,
    },
    NotificationExpired {
        ticket: Ticket,
    },
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::DraftReady { .. } => "draft_ready",
            ControllerEvent::EvaluationFinished { .. } => "evaluation_finished",
            ControllerEvent::NotificationExpired { .. } => "notification_expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied(&'static str),
    Stale(&'static str),
}
