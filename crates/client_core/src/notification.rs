use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    time::{sleep_until, Instant},
};
use tracing::debug;

use crate::events::{is_current, ControllerEvent, PendingTask, Ticket};

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Published,
    Withdrawn,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Published => "Homework published",
            NotificationKind::Withdrawn => "Publication withdrawn",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            NotificationKind::Published => "The patient will be reminded about the new homework",
            NotificationKind::Withdrawn => "The homework has been removed from the patient's app",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationState {
    pub visible: bool,
    pub kind: Option<NotificationKind>,
    pub expires_at: Option<Instant>,
}

impl NotificationState {
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Only a visible `published` notification offers undo.
    pub fn undo_available(&self) -> bool {
        self.visible && self.kind == Some(NotificationKind::Published)
    }
}

/// Owns the expiry task of the current notification. Showing a new
/// notification aborts the previous expiry; dropping the timer aborts it too.
pub struct NotificationTimer {
    duration: Duration,
    events: UnboundedSender<ControllerEvent>,
    last_ticket: Ticket,
    pending: Option<PendingTask>,
}

impl NotificationTimer {
    pub fn new(duration: Duration, events: UnboundedSender<ControllerEvent>) -> Self {
        Self {
            duration,
            events,
            last_ticket: 0,
            pending: None,
        }
    }

    pub fn show(&mut self, kind: NotificationKind) -> NotificationState {
        self.cancel();
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        let expires_at = Instant::now() + self.duration;

        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            sleep_until(expires_at).await;
            let _ = events.send(ControllerEvent::NotificationExpired { ticket });
        });
        self.pending = Some(PendingTask::new(ticket, handle));
        debug!(?kind, ticket, "notification shown");

        NotificationState {
            visible: true,
            kind: Some(kind),
            expires_at: Some(expires_at),
        }
    }

    /// Consumes an expiry. Returns `false` when the ticket belongs to a
    /// notification that has since been replaced or cancelled.
    pub fn expire(&mut self, ticket: Ticket) -> bool {
        if !is_current(&self.pending, ticket) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
#[path = "tests/notification_tests.rs"]
mod tests;
