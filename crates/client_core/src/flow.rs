use std::fmt;

use shared::{
    domain::{Homework, HomeworkKind, Patient, Session, TextSpan},
    scoring::EvaluationResult,
};
use thiserror::Error;

use crate::{
    error::ClientError,
    notification::{NotificationKind, NotificationState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Create,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Center,
    SelectPatient,
    SelectSession,
    EditHomework,
    PreviewHomework,
    PatientDashboard,
    HomeworkDetail,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Center => "center",
            Step::SelectPatient => "select-patient",
            Step::SelectSession => "select-session",
            Step::EditHomework => "edit-homework",
            Step::PreviewHomework => "preview-homework",
            Step::PatientDashboard => "patient-dashboard",
            Step::HomeworkDetail => "homework-detail",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewState {
    pub feedback: String,
    pub evaluation: Option<EvaluationResult>,
    pub is_evaluating: bool,
    pub last_error: Option<ClientError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Center,
    SelectPatient {
        flow: Flow,
    },
    SelectSession {
        patient: Patient,
    },
    /// `draft` is `None` while the draft is still being generated.
    EditHomework {
        patient: Patient,
        session: Session,
        draft: Option<Homework>,
    },
    PreviewHomework {
        patient: Patient,
        session: Session,
        draft: Homework,
    },
    PatientDashboard {
        patient: Patient,
    },
    HomeworkDetail {
        patient: Patient,
        homework: Homework,
        review: ReviewState,
    },
}

#[derive(Debug, Clone)]
pub enum Operation {
    StartCreate,
    StartView,
    PickPatientForCreate(Patient),
    PickPatientForView(Patient),
    PickSession(Session),
    DraftGenerated(Homework),
    BackFromSessionList,
    BackFromEditor,
    SelectTemplate(HomeworkKind),
    HighlightSummary(TextSpan),
    ClearHighlights,
    UpdateNotes(String),
    RequestPreview(Homework),
    BackFromPreview,
    Publish(Option<Homework>),
    ViewHomework(Homework),
    UpdateFeedback(String),
    BeginEvaluation,
    FinishEvaluation(Result<EvaluationResult, ClientError>),
    BackFromDetail,
    BackFromDashboard,
    ResetToCenter,
    Withdraw,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::StartCreate => "start_create",
            Operation::StartView => "start_view",
            Operation::PickPatientForCreate(_) => "pick_patient_for_create",
            Operation::PickPatientForView(_) => "pick_patient_for_view",
            Operation::PickSession(_) => "pick_session",
            Operation::DraftGenerated(_) => "draft_generated",
            Operation::BackFromSessionList => "back_from_session_list",
            Operation::BackFromEditor => "back_from_editor",
            Operation::SelectTemplate(_) => "select_template",
            Operation::HighlightSummary(_) => "highlight_summary",
            Operation::ClearHighlights => "clear_highlights",
            Operation::UpdateNotes(_) => "update_notes",
            Operation::RequestPreview(_) => "request_preview",
            Operation::BackFromPreview => "back_from_preview",
            Operation::Publish(_) => "publish",
            Operation::ViewHomework(_) => "view_homework",
            Operation::UpdateFeedback(_) => "update_feedback",
            Operation::BeginEvaluation => "begin_evaluation",
            Operation::FinishEvaluation(_) => "finish_evaluation",
            Operation::BackFromDetail => "back_from_detail",
            Operation::BackFromDashboard => "back_from_dashboard",
            Operation::ResetToCenter => "reset_to_center",
            Operation::Withdraw => "withdraw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    GenerateDraft(Session),
    Evaluate { submission_text: String },
    Published { patient: Patient, homework: Homework },
    Notify(NotificationKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("{operation} is not allowed at step {step}")]
    InvalidTransition { operation: &'static str, step: Step },
    #[error("an evaluation is already in progress")]
    EvaluationInProgress,
    #[error("highlight {}..{} does not fit the summary", .0.start, .0.end)]
    InvalidHighlight(TextSpan),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: FlowState,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    screen: Screen,
    notification: NotificationState,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            screen: Screen::Center,
            notification: NotificationState::hidden(),
        }
    }
}

impl FlowState {
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn notification(&self) -> NotificationState {
        self.notification
    }

    pub(crate) fn set_notification(&mut self, notification: NotificationState) {
        self.notification = notification;
    }

    pub fn flow(&self) -> Option<Flow> {
        match &self.screen {
            Screen::Center => None,
            Screen::SelectPatient { flow } => Some(*flow),
            Screen::SelectSession { .. }
            | Screen::EditHomework { .. }
            | Screen::PreviewHomework { .. } => Some(Flow::Create),
            Screen::PatientDashboard { .. } | Screen::HomeworkDetail { .. } => Some(Flow::View),
        }
    }

    pub fn step(&self) -> Step {
        match &self.screen {
            Screen::Center => Step::Center,
            Screen::SelectPatient { .. } => Step::SelectPatient,
            Screen::SelectSession { .. } => Step::SelectSession,
            Screen::EditHomework { .. } => Step::EditHomework,
            Screen::PreviewHomework { .. } => Step::PreviewHomework,
            Screen::PatientDashboard { .. } => Step::PatientDashboard,
            Screen::HomeworkDetail { .. } => Step::HomeworkDetail,
        }
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        match &self.screen {
            Screen::Center | Screen::SelectPatient { .. } => None,
            Screen::SelectSession { patient }
            | Screen::EditHomework { patient, .. }
            | Screen::PreviewHomework { patient, .. }
            | Screen::PatientDashboard { patient }
            | Screen::HomeworkDetail { patient, .. } => Some(patient),
        }
    }

    pub fn selected_session(&self) -> Option<&Session> {
        match &self.screen {
            Screen::EditHomework { session, .. } | Screen::PreviewHomework { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }

    pub fn draft_homework(&self) -> Option<&Homework> {
        match &self.screen {
            Screen::EditHomework { draft, .. } => draft.as_ref(),
            Screen::PreviewHomework { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn viewing_homework(&self) -> Option<&Homework> {
        match &self.screen {
            Screen::HomeworkDetail { homework, .. } => Some(homework),
            _ => None,
        }
    }

    pub fn review(&self) -> Option<&ReviewState> {
        match &self.screen {
            Screen::HomeworkDetail { review, .. } => Some(review),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.screen == Screen::Center
    }

    /// Computes the state that `op` leads to. On error the caller keeps the
    /// current state untouched.
    pub fn apply(&self, op: Operation) -> Result<Transition, FlowError> {
        let invalid = FlowError::InvalidTransition {
            operation: op.name(),
            step: self.step(),
        };

        let (screen, effect) = match (&self.screen, op) {
            (Screen::Center, Operation::StartCreate) => (
                Screen::SelectPatient { flow: Flow::Create },
                Effect::None,
            ),
            (Screen::Center, Operation::StartView) => {
                (Screen::SelectPatient { flow: Flow::View }, Effect::None)
            }
            (
                Screen::SelectPatient { flow: Flow::Create },
                Operation::PickPatientForCreate(patient),
            ) => (Screen::SelectSession { patient }, Effect::None),
            (Screen::SelectPatient { flow: Flow::View }, Operation::PickPatientForView(patient)) => {
                (Screen::PatientDashboard { patient }, Effect::None)
            }
            (Screen::SelectSession { patient }, Operation::PickSession(session)) => {
                if session.patient_id != patient.id {
                    return Err(invalid);
                }
                (
                    Screen::EditHomework {
                        patient: patient.clone(),
                        session: session.clone(),
                        draft: None,
                    },
                    Effect::GenerateDraft(session),
                )
            }
            (
                Screen::EditHomework {
                    patient,
                    session,
                    draft: None,
                },
                Operation::DraftGenerated(homework),
            ) => (
                Screen::EditHomework {
                    patient: patient.clone(),
                    session: session.clone(),
                    draft: Some(homework),
                },
                Effect::None,
            ),
            (Screen::SelectSession { .. }, Operation::BackFromSessionList) => (
                Screen::SelectPatient { flow: Flow::Create },
                Effect::None,
            ),
            (Screen::EditHomework { patient, .. }, Operation::BackFromEditor) => (
                Screen::SelectSession {
                    patient: patient.clone(),
                },
                Effect::None,
            ),
            (
                Screen::EditHomework {
                    patient,
                    session,
                    draft: Some(draft),
                },
                Operation::SelectTemplate(kind),
            ) => {
                let mut draft = draft.clone();
                draft.title = kind.title().to_string();
                (edit_screen(patient, session, draft), Effect::None)
            }
            (
                Screen::EditHomework {
                    patient,
                    session,
                    draft: Some(draft),
                },
                Operation::HighlightSummary(span),
            ) => {
                let mut draft = draft.clone();
                if !draft.add_highlight(span) {
                    return Err(FlowError::InvalidHighlight(span));
                }
                (edit_screen(patient, session, draft), Effect::None)
            }
            (
                Screen::EditHomework {
                    patient,
                    session,
                    draft: Some(draft),
                },
                Operation::ClearHighlights,
            ) => {
                let mut draft = draft.clone();
                draft.highlights.clear();
                (edit_screen(patient, session, draft), Effect::None)
            }
            (
                Screen::EditHomework {
                    patient,
                    session,
                    draft: Some(draft),
                },
                Operation::UpdateNotes(notes),
            ) => {
                let mut draft = draft.clone();
                draft.therapist_notes = notes;
                (edit_screen(patient, session, draft), Effect::None)
            }
            (
                Screen::PreviewHomework {
                    patient,
                    session,
                    draft,
                },
                Operation::UpdateNotes(notes),
            ) => {
                let mut draft = draft.clone();
                draft.therapist_notes = notes;
                (
                    Screen::PreviewHomework {
                        patient: patient.clone(),
                        session: session.clone(),
                        draft,
                    },
                    Effect::None,
                )
            }
            (Screen::EditHomework { patient, session, .. }, Operation::RequestPreview(draft)) => (
                Screen::PreviewHomework {
                    patient: patient.clone(),
                    session: session.clone(),
                    draft,
                },
                Effect::None,
            ),
            (
                Screen::PreviewHomework {
                    patient,
                    session,
                    draft,
                },
                Operation::BackFromPreview,
            ) => (edit_screen(patient, session, draft.clone()), Effect::None),
            (Screen::PreviewHomework { patient, draft, .. }, Operation::Publish(updated)) => (
                Screen::Center,
                Effect::Published {
                    patient: patient.clone(),
                    homework: updated.unwrap_or_else(|| draft.clone()),
                },
            ),
            (Screen::Center, Operation::Publish(_)) => (Screen::Center, Effect::None),
            (Screen::PatientDashboard { patient }, Operation::ViewHomework(homework)) => (
                Screen::HomeworkDetail {
                    patient: patient.clone(),
                    homework,
                    review: ReviewState::default(),
                },
                Effect::None,
            ),
            (
                Screen::HomeworkDetail {
                    patient,
                    homework,
                    review,
                },
                Operation::UpdateFeedback(feedback),
            ) => {
                let review = ReviewState {
                    feedback,
                    ..review.clone()
                };
                (detail_screen(patient, homework, review), Effect::None)
            }
            (
                Screen::HomeworkDetail {
                    patient,
                    homework,
                    review,
                },
                Operation::BeginEvaluation,
            ) => {
                if review.is_evaluating {
                    return Err(FlowError::EvaluationInProgress);
                }
                let submission_text = homework
                    .submission
                    .as_ref()
                    .map(|submission| submission.content.trim())
                    .filter(|content| !content.is_empty())
                    .ok_or(ClientError::EmptySubmission)?
                    .to_string();
                let review = ReviewState {
                    is_evaluating: true,
                    last_error: None,
                    ..review.clone()
                };
                (
                    detail_screen(patient, homework, review),
                    Effect::Evaluate { submission_text },
                )
            }
            (
                Screen::HomeworkDetail {
                    patient,
                    homework,
                    review,
                },
                Operation::FinishEvaluation(result),
            ) if review.is_evaluating => {
                let review = finish_review(review, result);
                (detail_screen(patient, homework, review), Effect::None)
            }
            (Screen::HomeworkDetail { patient, .. }, Operation::BackFromDetail) => (
                Screen::PatientDashboard {
                    patient: patient.clone(),
                },
                Effect::None,
            ),
            (Screen::PatientDashboard { .. }, Operation::BackFromDashboard) => {
                (Screen::SelectPatient { flow: Flow::View }, Effect::None)
            }
            (_, Operation::ResetToCenter) => (Screen::Center, Effect::None),
            (screen, Operation::Withdraw) if self.notification.undo_available() => (
                screen.clone(),
                Effect::Notify(NotificationKind::Withdrawn),
            ),
            _ => return Err(invalid),
        };

        Ok(Transition {
            state: FlowState {
                screen,
                notification: self.notification,
            },
            effect,
        })
    }
}

fn edit_screen(patient: &Patient, session: &Session, draft: Homework) -> Screen {
    Screen::EditHomework {
        patient: patient.clone(),
        session: session.clone(),
        draft: Some(draft),
    }
}

fn detail_screen(patient: &Patient, homework: &Homework, review: ReviewState) -> Screen {
    Screen::HomeworkDetail {
        patient: patient.clone(),
        homework: homework.clone(),
        review,
    }
}

fn finish_review(
    review: &ReviewState,
    result: Result<EvaluationResult, ClientError>,
) -> ReviewState {
    let mut review = ReviewState {
        is_evaluating: false,
        ..review.clone()
    };
    let result = result.and_then(|evaluation| {
        if u16::from(evaluation.total_score()) != evaluation.dimension_sum() {
            return Err(ClientError::MalformedResponse(format!(
                "dimension scores sum to {} but total is {}",
                evaluation.dimension_sum(),
                evaluation.total_score()
            )));
        }
        Ok(evaluation)
    });
    match result {
        Ok(evaluation) => {
            review.feedback = evaluation.patient_feedback().to_string();
            review.evaluation = Some(evaluation);
            review.last_error = None;
        }
        Err(err) => review.last_error = Some(err),
    }
    review
}

#[cfg(test)]
#[path = "tests/flow_tests.rs"]
mod tests;
