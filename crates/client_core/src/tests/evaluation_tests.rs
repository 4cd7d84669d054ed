use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tokio::net::TcpListener;

#[derive(Clone, Copy)]
enum Reply {
    Valid,
    SumMismatch,
    Unavailable,
    Garbage,
}

#[derive(Clone)]
struct ScoringState {
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

async fn handle_evaluate(
    State(state): State<ScoringState>,
    Json(req): Json<EvaluateRequest>,
) -> (StatusCode, String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let valid = EvaluationResponse {
        total_score: 70,
        score_context: 16,
        score_emotion: 15,
        score_thought: 14,
        score_restructuring: 13,
        score_action_plan: 12,
        doctor_comments: format!("reviewed {} chars", req.submission_text.len()),
        patient_feedback: "Nice progress spotting catastrophising.".into(),
    };
    match state.reply {
        Reply::Valid => (
            StatusCode::OK,
            serde_json::to_string(&valid).expect("json"),
        ),
        Reply::SumMismatch => {
            let mut body = valid;
            body.total_score = 90;
            (StatusCode::OK, serde_json::to_string(&body).expect("json"))
        }
        Reply::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "busy".to_string()),
        Reply::Garbage => (StatusCode::OK, "{\"total_score\":".to_string()),
    }
}

async fn spawn_scoring_server(reply: Reply) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let calls = Arc::new(AtomicUsize::new(0));
    let state = ScoringState {
        reply,
        calls: calls.clone(),
    };
    let app = Router::new()
        .route("/evaluate_cbt", post(handle_evaluate))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), calls)
}

#[tokio::test]
async fn evaluate_returns_validated_result() {
    let (url, calls) = spawn_scoring_server(Reply::Valid).await;
    let client = EvaluationClient::new(format!("{url}/"));

    let result = client
        .evaluate("Monday: worried I'd be criticised at the stand-up.")
        .await
        .expect("evaluation");

    assert_eq!(result.total_score(), 70);
    assert_eq!(result.dimension_sum(), 70);
    assert_eq!(
        result.patient_feedback(),
        "Nice progress spotting catastrophising."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_submission_is_rejected_before_any_request() {
    let (url, calls) = spawn_scoring_server(Reply::Valid).await;
    let client = EvaluationClient::new(url);

    let err = client.evaluate("  \n\t ").await.expect_err("empty");

    assert_eq!(err, ClientError::EmptySubmission);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sum_mismatch_is_reported_as_malformed() {
    let (url, _calls) = spawn_scoring_server(Reply::SumMismatch).await;
    let client = EvaluationClient::new(url);

    let err = client.evaluate("some text").await.expect_err("malformed");

    assert!(matches!(err, ClientError::MalformedResponse(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn undecodable_body_is_reported_as_malformed() {
    let (url, _calls) = spawn_scoring_server(Reply::Garbage).await;
    let client = EvaluationClient::new(url);

    let err = client.evaluate("some text").await.expect_err("malformed");

    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn non_success_status_is_service_unavailable_and_retryable() {
    let (url, calls) = spawn_scoring_server(Reply::Unavailable).await;
    let client = EvaluationClient::new(url);

    let first = client.evaluate("some text").await.expect_err("unavailable");
    let second = client.evaluate("some text").await.expect_err("unavailable");

    assert!(matches!(first, ClientError::ServiceUnavailable(_)));
    assert_eq!(first, second);
    assert_eq!(first.user_message(), ClientError::MalformedResponse(String::new()).user_message());
    // Each retry is a fresh call; the client does not retry by itself.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_service_is_service_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = EvaluationClient::with_timeout(format!("http://{addr}"), Duration::from_secs(2))
        .expect("client");

    let err = client.evaluate("some text").await.expect_err("unreachable");

    assert!(matches!(err, ClientError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn missing_evaluator_still_validates_input() {
    assert_eq!(
        MissingEvaluator.evaluate("").await.expect_err("empty"),
        ClientError::EmptySubmission
    );
    assert!(matches!(
        MissingEvaluator.evaluate("text").await.expect_err("missing"),
        ClientError::ServiceUnavailable(_)
    ));
}

#[tokio::test]
async fn configured_timeout_bounds_a_slow_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        "/evaluate_cbt",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let client = EvaluationClient::with_timeout(format!("http://{addr}"), Duration::from_millis(200))
        .expect("client");

    let started = std::time::Instant::now();
    let err = client.evaluate("some text").await.expect_err("timed out");

    assert!(matches!(err, ClientError::ServiceUnavailable(_)));
    assert!(started.elapsed() < Duration::from_secs(4));
}
