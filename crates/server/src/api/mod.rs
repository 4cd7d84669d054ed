use shared::{
    domain::{Patient, Session},
    error::{ApiError, ErrorCode},
    protocol::{EvaluateRequest, EvaluationResponse, HomeworkRecord, NewHomework},
};
use tracing::{error, info};

use crate::{scoring::score_submission, store::HomeworkStore};

#[derive(Clone)]
pub struct ApiContext {
    pub store: HomeworkStore,
}

pub async fn list_patients(ctx: &ApiContext) -> Vec<Patient> {
    ctx.store.patients().await
}

pub async fn list_sessions(ctx: &ApiContext) -> Vec<Session> {
    ctx.store.sessions().await
}

pub async fn list_homeworks(ctx: &ApiContext) -> Vec<HomeworkRecord> {
    ctx.store.homeworks().await
}

pub async fn create_homework(
    ctx: &ApiContext,
    draft: NewHomework,
) -> Result<HomeworkRecord, ApiError> {
    let record = ctx.store.insert_homework(draft).await?;
    info!(
        homework_id = record.id,
        patient_id = %record.patient_id,
        status = record.status.label(),
        "homework stored"
    );
    Ok(record)
}

pub fn evaluate_submission(req: &EvaluateRequest) -> Result<EvaluationResponse, ApiError> {
    let text = req.submission_text.trim();
    if text.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "submission_text must not be empty",
        ));
    }

    let result = score_submission(text).map_err(|err| {
        error!(%err, "scorer produced an invalid evaluation");
        ApiError::new(ErrorCode::Internal, err.to_string())
    })?;
    info!(
        total_score = result.total_score(),
        chars = text.chars().count(),
        "submission evaluated"
    );
    Ok(result.to_response())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
