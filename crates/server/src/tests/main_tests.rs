use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
    response::Response,
};
use shared::domain::HomeworkStatus;
use tower::ServiceExt;

const TEST_BODY_LIMIT: usize = 4096;

fn test_app() -> Router {
    build_router(
        Arc::new(AppState {
            api: ApiContext {
                store: HomeworkStore::seeded(),
            },
        }),
        TEST_BODY_LIMIT,
    )
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    let raw = body.to_string();
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, raw.len())
        .body(Body::from(raw))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let request = Request::get("/healthz").body(Body::empty()).expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn lists_patients_and_sessions() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/api/patients").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let patients: Vec<Patient> = read_json(response).await;
    assert_eq!(patients.len(), 3);

    let response = app
        .oneshot(Request::get("/api/sessions").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let sessions: Vec<Session> = read_json(response).await;
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().any(|session| session.starred));
}

#[tokio::test]
async fn posted_homework_is_created_and_listed() {
    let app = test_app();
    let request = json_post(
        "/api/homeworks",
        serde_json::json!({
            "patientId": 2,
            "sessionId": 3,
            "title": "Relaxation practice",
            "status": "submitted",
            "dueDate": "2023-11-03",
            "description": "Daily relaxation",
            "submission": { "content": "Practised twice", "submittedAt": "2023-11-03T09:00:00Z" }
        }),
    );
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: HomeworkRecord = read_json(response).await;
    assert_eq!(created.id, 4);
    assert_eq!(created.status, HomeworkStatus::Submitted);

    let response = app
        .oneshot(Request::get("/api/homeworks").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let homeworks: Vec<HomeworkRecord> = read_json(response).await;
    assert_eq!(homeworks.len(), 4);
    assert_eq!(homeworks.last(), Some(&created));
}

#[tokio::test]
async fn blank_title_returns_validation_error() {
    let request = json_post(
        "/api/homeworks",
        serde_json::json!({
            "patientId": 1,
            "title": " ",
            "status": "pending",
            "dueDate": "2023-11-03"
        }),
    );
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn evaluate_returns_consistent_scores() {
    let request = json_post(
        evaluate_route(),
        serde_json::json!({
            "submission_text": "Yesterday at work I felt anxious and thought I had failed. I realised there was no evidence and I will plan my week."
        }),
    );
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let scores: EvaluationResponse = read_json(response).await;
    let sum = scores.score_context
        + scores.score_emotion
        + scores.score_thought
        + scores.score_restructuring
        + scores.score_action_plan;
    assert_eq!(sum, scores.total_score);
    assert!(scores.total_score > 0);
}

#[tokio::test]
async fn evaluate_rejects_empty_text() {
    let request = json_post(evaluate_route(), serde_json::json!({ "submission_text": "   " }));
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let request = json_post(
        evaluate_route(),
        serde_json::json!({ "submission_text": "x".repeat(TEST_BODY_LIMIT * 2) }),
    );
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn validation_status_depends_on_route() {
    assert_eq!(
        status_for(ErrorCode::Validation, StatusCode::BAD_REQUEST),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_for(ErrorCode::Internal, StatusCode::BAD_REQUEST),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
