use std::{sync::Arc, time::Duration};

use chrono::Utc;
use shared::domain::{Homework, HomeworkKind, Patient, Session, TextSpan};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    drafting::draft_from_session,
    evaluation::Evaluator,
    events::{is_current, ControllerEvent, EventOutcome, PendingTask, Ticket},
    flow::{Effect, FlowError, FlowState, Operation, Step, Transition},
    notification::{NotificationKind, NotificationState, NotificationTimer, DEFAULT_NOTIFICATION_DURATION},
};

pub const DEFAULT_DRAFT_GENERATION_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub notification_duration: Duration,
    pub draft_generation_delay: Duration,
    pub default_template: HomeworkKind,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            draft_generation_delay: DEFAULT_DRAFT_GENERATION_DELAY,
            default_template: HomeworkKind::ThoughtRecord,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedHomework {
    pub patient: Patient,
    pub homework: Homework,
}

/// Drives one therapist's workflow. All methods must be called from within a
/// tokio runtime because transitions may spawn background tasks.
pub struct FlowController {
    state: FlowState,
    config: ControllerConfig,
    evaluator: Arc<dyn Evaluator>,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
    notification: NotificationTimer,
    last_ticket: Ticket,
    draft_task: Option<PendingTask>,
    evaluation_task: Option<PendingTask>,
    last_published: Option<PublishedHomework>,
}

impl FlowController {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self::with_config(evaluator, ControllerConfig::default())
    }

    pub fn with_config(evaluator: Arc<dyn Evaluator>, config: ControllerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let notification = NotificationTimer::new(config.notification_duration, events_tx.clone());
        Self {
            state: FlowState::default(),
            config,
            evaluator,
            events_tx,
            events_rx,
            notification,
            last_ticket: 0,
            draft_task: None,
            evaluation_task: None,
            last_published: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn last_published(&self) -> Option<&PublishedHomework> {
        self.last_published.as_ref()
    }

    pub fn is_generating_draft(&self) -> bool {
        self.draft_task.is_some()
    }

    pub fn start_create(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::StartCreate).map(drop)
    }

    pub fn start_view(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::StartView).map(drop)
    }

    pub fn pick_patient_for_create(&mut self, patient: Patient) -> Result<(), FlowError> {
        self.dispatch(Operation::PickPatientForCreate(patient)).map(drop)
    }

    pub fn pick_patient_for_view(&mut self, patient: Patient) -> Result<(), FlowError> {
        self.dispatch(Operation::PickPatientForView(patient)).map(drop)
    }

    pub fn pick_session(&mut self, session: Session) -> Result<(), FlowError> {
        self.dispatch(Operation::PickSession(session)).map(drop)
    }

    pub fn back_from_session_list(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BackFromSessionList).map(drop)
    }

    pub fn back_from_editor(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BackFromEditor).map(drop)
    }

    pub fn select_template(&mut self, kind: HomeworkKind) -> Result<(), FlowError> {
        self.dispatch(Operation::SelectTemplate(kind)).map(drop)
    }

    pub fn highlight_summary(&mut self, span: TextSpan) -> Result<(), FlowError> {
        self.dispatch(Operation::HighlightSummary(span)).map(drop)
    }

    pub fn clear_highlights(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::ClearHighlights).map(drop)
    }

    pub fn update_notes(&mut self, notes: impl Into<String>) -> Result<(), FlowError> {
        self.dispatch(Operation::UpdateNotes(notes.into())).map(drop)
    }

    pub fn request_preview(&mut self, homework: Homework) -> Result<(), FlowError> {
        self.dispatch(Operation::RequestPreview(homework)).map(drop)
    }

    pub fn back_from_preview(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BackFromPreview).map(drop)
    }

    /// Publishes the previewed draft, or `updated` when given. Returns what
    /// was published; publishing from the center screen is a no-op.
    pub fn publish(
        &mut self,
        updated: Option<Homework>,
    ) -> Result<Option<PublishedHomework>, FlowError> {
        match self.dispatch(Operation::Publish(updated))? {
            Effect::Published { .. } => Ok(self.last_published.clone()),
            _ => Ok(None),
        }
    }

    pub fn view_homework(&mut self, homework: Homework) -> Result<(), FlowError> {
        self.dispatch(Operation::ViewHomework(homework)).map(drop)
    }

    pub fn update_feedback(&mut self, feedback: impl Into<String>) -> Result<(), FlowError> {
        self.dispatch(Operation::UpdateFeedback(feedback.into())).map(drop)
    }

    pub fn request_evaluation(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BeginEvaluation).map(drop)
    }

    pub fn back_from_detail(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BackFromDetail).map(drop)
    }

    pub fn back_from_dashboard(&mut self) -> Result<(), FlowError> {
        self.dispatch(Operation::BackFromDashboard).map(drop)
    }

    pub fn reset_to_center(&mut self) {
        // Allowed from every state.
        if let Err(err) = self.dispatch(Operation::ResetToCenter) {
            warn!(%err, "reset rejected");
        }
    }

    /// Undoes the last publish while its notification is still showing and
    /// returns the withdrawn homework.
    pub fn withdraw(&mut self) -> Result<Option<PublishedHomework>, FlowError> {
        self.dispatch(Operation::Withdraw)?;
        let withdrawn = self.last_published.take();
        if let Some(published) = &withdrawn {
            info!(
                patient = %published.patient.id,
                title = %published.homework.title,
                "homework withdrawn"
            );
        }
        Ok(withdrawn)
    }

    /// Applies one completion. Completions for tasks that were cancelled or
    /// superseded are reported as stale and leave the state untouched.
    pub fn handle_event(&mut self, event: ControllerEvent) -> EventOutcome {
        let name = event.name();
        let applied = match event {
            ControllerEvent::DraftReady { ticket, homework } => {
                is_current(&self.draft_task, ticket)
                    && self.complete(Operation::DraftGenerated(homework))
            }
            ControllerEvent::EvaluationFinished { ticket, result } => {
                is_current(&self.evaluation_task, ticket)
                    && self.complete(Operation::FinishEvaluation(result))
            }
            ControllerEvent::NotificationExpired { ticket } => {
                let current = self.notification.expire(ticket);
                if current {
                    self.state.set_notification(NotificationState::hidden());
                }
                current
            }
        };

        if applied {
            debug!(event = name, step = %self.state.step(), "event applied");
            EventOutcome::Applied(name)
        } else {
            debug!(event = name, "stale event dropped");
            EventOutcome::Stale(name)
        }
    }

    pub async fn next_event(&mut self) -> Option<EventOutcome> {
        let event = self.events_rx.recv().await?;
        Some(self.handle_event(event))
    }

    pub fn drain_ready(&mut self) -> Vec<EventOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => outcomes.push(self.handle_event(event)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        outcomes
    }

    fn complete(&mut self, op: Operation) -> bool {
        match self.dispatch(op) {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "completion could not be applied");
                false
            }
        }
    }

    fn dispatch(&mut self, op: Operation) -> Result<Effect, FlowError> {
        let operation = op.name();
        let from = self.state.step();
        let Transition { state, effect } = self.state.apply(op).map_err(|err| {
            warn!(operation, step = %from, %err, "operation rejected");
            err
        })?;

        self.state = state;
        self.release_tasks();
        debug!(operation, %from, to = %self.state.step(), "transition applied");
        self.run_effect(effect.clone());
        Ok(effect)
    }

    fn release_tasks(&mut self) {
        let awaiting_draft = self.state.step() == Step::EditHomework
            && self.state.draft_homework().is_none();
        if !awaiting_draft && self.draft_task.take().is_some() {
            debug!("draft generation cancelled");
        }

        let evaluating = self
            .state
            .review()
            .is_some_and(|review| review.is_evaluating);
        if !evaluating {
            self.evaluation_task = None;
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::GenerateDraft(session) => self.spawn_draft(session),
            Effect::Evaluate { submission_text } => self.spawn_evaluation(submission_text),
            Effect::Published { patient, homework } => {
                info!(patient = %patient.id, title = %homework.title, "homework published");
                self.last_published = Some(PublishedHomework { patient, homework });
                self.show_notification(NotificationKind::Published);
            }
            Effect::Notify(kind) => self.show_notification(kind),
        }
    }

    fn next_ticket(&mut self) -> Ticket {
        self.last_ticket += 1;
        self.last_ticket
    }

    fn spawn_draft(&mut self, session: Session) {
        let ticket = self.next_ticket();
        let delay = self.config.draft_generation_delay;
        let kind = self.config.default_template;
        let events = self.events_tx.clone();
        debug!(session = %session.id, ticket, "draft generation started");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let homework = draft_from_session(&session, kind, Utc::now().date_naive());
            let _ = events.send(ControllerEvent::DraftReady { ticket, homework });
        });
        self.draft_task = Some(PendingTask::new(ticket, handle));
    }

    fn spawn_evaluation(&mut self, submission_text: String) {
        let ticket = self.next_ticket();
        let evaluator = Arc::clone(&self.evaluator);
        let events = self.events_tx.clone();
        debug!(ticket, chars = submission_text.chars().count(), "evaluation started");

        let handle = tokio::spawn(async move {
            let result = evaluator.evaluate(&submission_text).await;
            let _ = events.send(ControllerEvent::EvaluationFinished { ticket, result });
        });
        self.evaluation_task = Some(PendingTask::new(ticket, handle));
    }

    fn show_notification(&mut self, kind: NotificationKind) {
        let shown = self.notification.show(kind);
        self.state.set_notification(shown);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
