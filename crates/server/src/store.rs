use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use shared::{
    domain::{HomeworkStatus, Patient, PatientId, Session, SessionId, SubmissionContent},
    error::{ApiException, ErrorCode},
    protocol::{FeedbackContent, HomeworkRecord, NewHomework},
};
use tokio::sync::RwLock;

const AVATAR_URL: &str = "https://cdn.example.com/avatars/default.png";

#[derive(Clone, Default)]
pub struct HomeworkStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    patients: Vec<Patient>,
    sessions: Vec<Session>,
    homeworks: Vec<HomeworkRecord>,
    last_id: i64,
}

impl HomeworkStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        let homeworks = seed_homeworks();
        let last_id = homeworks.iter().map(|record| record.id).max().unwrap_or(0);
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                patients: seed_patients(),
                sessions: seed_sessions(),
                homeworks,
                last_id,
            })),
        }
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.inner.read().await.patients.clone()
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.inner.read().await.sessions.clone()
    }

    pub async fn homeworks(&self) -> Vec<HomeworkRecord> {
        self.inner.read().await.homeworks.clone()
    }

    pub async fn insert_homework(
        &self,
        draft: NewHomework,
    ) -> Result<HomeworkRecord, ApiException> {
        if draft.title.trim().is_empty() {
            return Err(ApiException::new(
                ErrorCode::Validation,
                "homework title must not be empty",
            ));
        }

        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let record = HomeworkRecord::from_new(inner.last_id, draft);
        inner.homeworks.push(record.clone());
        Ok(record)
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn seed_patients() -> Vec<Patient> {
    [(1, "Zhang San", 26), (2, "Li Si", 25), (3, "Wang Wu", 24)]
        .into_iter()
        .map(|(id, name, day)| Patient {
            id: PatientId(id),
            name: name.to_string(),
            last_session: date(2023, 10, day),
            avatar: AVATAR_URL.to_string(),
        })
        .collect()
}

fn seed_sessions() -> Vec<Session> {
    let session = |id, patient_id, day, duration_minutes, summary: &str, emotions: &[&str], starred| {
        Session {
            id: SessionId(id),
            patient_id: PatientId(patient_id),
            date: date(2023, 10, day),
            duration_minutes,
            emotions: emotions.iter().map(|e| e.to_string()).collect::<BTreeSet<_>>(),
            analyzed: true,
            transcript: None,
            summary: Some(summary.to_string()),
            starred,
        }
    };
    vec![
        session(
            1,
            1,
            26,
            50,
            "CBT session discussing automatic thoughts.",
            &["anxiety", "self-doubt"],
            true,
        ),
        session(
            2,
            1,
            19,
            45,
            "Initial assessment and building rapport.",
            &[],
            false,
        ),
        session(
            3,
            2,
            25,
            55,
            "Exposure work on anxious feelings.",
            &["anxiety", "fear"],
            true,
        ),
    ]
}

fn seed_homeworks() -> Vec<HomeworkRecord> {
    vec![
        HomeworkRecord {
            id: 1,
            patient_id: PatientId(1),
            session_id: Some(SessionId(1)),
            title: "Thought diary".into(),
            status: HomeworkStatus::Pending,
            due_date: date(2023, 11, 2),
            description: "Record the automatic thoughts of the week and try to identify the core beliefs behind them.".into(),
            submission: None,
            feedback: None,
        },
        HomeworkRecord {
            id: 2,
            patient_id: PatientId(1),
            session_id: Some(SessionId(2)),
            title: "Activity scheduling".into(),
            status: HomeworkStatus::Completed,
            due_date: date(2023, 10, 26),
            description: "Plan and carry out one activity you have been avoiding because of anxiety.".into(),
            submission: Some(SubmissionContent {
                content: "I went to the supermarket. I was tense at first but felt much better afterwards.".into(),
                submitted_at: "2023-10-25T18:30:00Z".into(),
            }),
            feedback: Some(FeedbackContent {
                content: "Well done! This is an important step forward.".into(),
                given_at: "2023-10-26T10:00:00Z".into(),
            }),
        },
        HomeworkRecord {
            id: 3,
            patient_id: PatientId(2),
            session_id: Some(SessionId(3)),
            title: "Relaxation practice".into(),
            status: HomeworkStatus::Submitted,
            due_date: date(2023, 11, 1),
            description: "Practise progressive muscle relaxation for 15 minutes every day.".into(),
            submission: Some(SubmissionContent {
                content: "I practised every day and it seems to help my sleep.".into(),
                submitted_at: "2023-10-31T21:00:00Z".into(),
            }),
            feedback: None,
        },
    ]
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
