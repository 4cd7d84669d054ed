use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Homework, HomeworkId, HomeworkStatus, PatientId, SessionId, SubmissionContent,
};

pub fn evaluate_route() -> &'static str {
    "/evaluate_cbt"
}

pub fn homeworks_route() -> &'static str {
    "/api/homeworks"
}

pub fn patients_route() -> &'static str {
    "/api/patients"
}

pub fn sessions_route() -> &'static str {
    "/api/sessions"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub submission_text: String,
}

/// Raw scoring-service response. Scores are kept as signed integers so the
/// client can reject out-of-range values instead of failing to decode them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub total_score: i64,
    pub score_context: i64,
    pub score_emotion: i64,
    pub score_thought: i64,
    pub score_restructuring: i64,
    pub score_action_plan: i64,
    pub doctor_comments: String,
    #[serde(default)]
    pub patient_feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackContent {
    pub content: String,
    pub given_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkRecord {
    pub id: i64,
    pub patient_id: PatientId,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub title: String,
    pub status: HomeworkStatus,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submission: Option<SubmissionContent>,
    #[serde(default)]
    pub feedback: Option<FeedbackContent>,
}

impl HomeworkRecord {
    pub fn from_new(id: i64, draft: NewHomework) -> Self {
        Self {
            id,
            patient_id: draft.patient_id,
            session_id: draft.session_id,
            title: draft.title,
            status: draft.status,
            due_date: draft.due_date,
            description: draft.description,
            submission: draft.submission,
            feedback: draft.feedback,
        }
    }

    pub fn into_homework(self) -> Homework {
        Homework {
            id: HomeworkId::Stored(self.id),
            title: self.title,
            description: self.description,
            ai_generated: String::new(),
            therapist_notes: self
                .feedback
                .map(|feedback| feedback.content)
                .unwrap_or_default(),
            publish_date: self.due_date,
            status: self.status,
            highlights: Vec::new(),
            submission: self.submission,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHomework {
    pub patient_id: PatientId,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub title: String,
    pub status: HomeworkStatus,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submission: Option<SubmissionContent>,
    #[serde(default)]
    pub feedback: Option<FeedbackContent>,
}

impl NewHomework {
    /// Builds the record a patient sends when handing in homework: status
    /// `submitted`, due today, no feedback yet.
    pub fn patient_submission(
        patient_id: PatientId,
        session_id: Option<SessionId>,
        title: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            patient_id,
            session_id,
            title: title.into(),
            status: HomeworkStatus::Submitted,
            due_date: now.date_naive(),
            description: description.into(),
            submission: Some(SubmissionContent {
                content: content.into(),
                submitted_at: now.to_rfc3339(),
            }),
            feedback: None,
        }
    }
}
