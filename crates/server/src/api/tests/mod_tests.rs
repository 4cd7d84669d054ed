use super::*;
use chrono::{TimeZone, Utc};
use shared::domain::{HomeworkStatus, PatientId, SessionId};

fn context() -> ApiContext {
    ApiContext {
        store: HomeworkStore::seeded(),
    }
}

#[tokio::test]
async fn listings_return_seed_data() {
    let ctx = context();
    let patients = list_patients(&ctx).await;
    assert_eq!(patients[0].name, "Zhang San");
    assert_eq!(list_sessions(&ctx).await.len(), 3);

    let homeworks = list_homeworks(&ctx).await;
    let statuses: Vec<_> = homeworks.iter().map(|record| record.status).collect();
    assert_eq!(
        statuses,
        vec![
            HomeworkStatus::Pending,
            HomeworkStatus::Completed,
            HomeworkStatus::Submitted
        ]
    );
}

#[tokio::test]
async fn created_homework_is_listed() {
    let ctx = context();
    let now = Utc.with_ymd_and_hms(2023, 11, 3, 9, 0, 0).unwrap();
    let draft = NewHomework::patient_submission(
        PatientId(1),
        Some(SessionId(1)),
        "Thought diary",
        "Weekly diary",
        "Monday: felt anxious before the meeting.",
        now,
    );

    let record = create_homework(&ctx, draft).await.expect("created");
    assert_eq!(record.id, 4);
    assert!(list_homeworks(&ctx).await.contains(&record));
}

#[tokio::test]
async fn blank_title_is_a_validation_error() {
    let ctx = context();
    let now = Utc.with_ymd_and_hms(2023, 11, 3, 9, 0, 0).unwrap();
    let draft = NewHomework::patient_submission(PatientId(1), None, "", "", "text", now);

    let err = create_homework(&ctx, draft).await.expect_err("invalid");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn evaluation_satisfies_sum_invariant() {
    let response = evaluate_submission(&EvaluateRequest {
        submission_text: "Yesterday I felt nervous and thought I would fail. I will plan ahead.".into(),
    })
    .expect("evaluated");
    let sum = response.score_context
        + response.score_emotion
        + response.score_thought
        + response.score_restructuring
        + response.score_action_plan;
    assert_eq!(sum, response.total_score);
    assert!(!response.patient_feedback.is_empty());
}

#[test]
fn whitespace_submission_is_rejected() {
    let err = evaluate_submission(&EvaluateRequest {
        submission_text: " \n\t ".into(),
    })
    .expect_err("empty");
    assert_eq!(err.code, ErrorCode::Validation);
}
