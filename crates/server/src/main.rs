use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{Patient, Session},
    error::{ApiError, ErrorCode},
    protocol::{
        evaluate_route, homeworks_route, patients_route, sessions_route, EvaluateRequest,
        EvaluationResponse, HomeworkRecord, NewHomework,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

mod api;
mod app_state;
mod config;
mod scoring;
mod store;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;
use store::HomeworkStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext {
            store: HomeworkStore::seeded(),
        },
    };
    let app = build_router(Arc::new(state), settings.request_body_limit);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, body_limit = settings.request_body_limit, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(patients_route(), get(http_list_patients))
        .route(sessions_route(), get(http_list_sessions))
        .route(
            homeworks_route(),
            get(http_list_homeworks).post(http_create_homework),
        )
        .route(evaluate_route(), post(http_evaluate))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_patients(State(state): State<Arc<AppState>>) -> Json<Vec<Patient>> {
    Json(api::list_patients(&state.api).await)
}

async fn http_list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<Session>> {
    Json(api::list_sessions(&state.api).await)
}

async fn http_list_homeworks(State(state): State<Arc<AppState>>) -> Json<Vec<HomeworkRecord>> {
    Json(api::list_homeworks(&state.api).await)
}

async fn http_create_homework(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<NewHomework>,
) -> Result<(StatusCode, Json<HomeworkRecord>), (StatusCode, Json<ApiError>)> {
    let record = api::create_homework(&state.api, draft)
        .await
        .map_err(|e| (status_for(e.code, StatusCode::BAD_REQUEST), Json(e)))?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn http_evaluate(
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResponse>, (StatusCode, Json<ApiError>)> {
    api::evaluate_submission(&req)
        .map(Json)
        .map_err(|e| (status_for(e.code, StatusCode::UNPROCESSABLE_ENTITY), Json(e)))
}

fn status_for(code: ErrorCode, validation: StatusCode) -> StatusCode {
    match code {
        ErrorCode::Validation => validation,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
