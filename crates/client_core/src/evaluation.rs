use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    protocol::{evaluate_route, EvaluateRequest, EvaluationResponse},
    scoring::EvaluationResult,
};
use tracing::{debug, warn};

use crate::error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, submission_text: &str) -> Result<EvaluationResult, ClientError>;
}

pub struct MissingEvaluator;

#[async_trait]
impl Evaluator for MissingEvaluator {
    async fn evaluate(&self, submission_text: &str) -> Result<EvaluationResult, ClientError> {
        ensure_submission(submission_text)?;
        Err(ClientError::ServiceUnavailable(
            "evaluation service is not configured".into(),
        ))
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ClientError::ServiceUnavailable(format!("failed to build http client: {err}")))
}

pub(crate) fn default_http_client() -> Client {
    http_client(DEFAULT_REQUEST_TIMEOUT).unwrap_or_else(|err| {
        warn!(%err, "using an http client without a request timeout");
        Client::new()
    })
}

fn ensure_submission(submission_text: &str) -> Result<(), ClientError> {
    if submission_text.trim().is_empty() {
        return Err(ClientError::EmptySubmission);
    }
    Ok(())
}

pub struct EvaluationClient {
    http: Client,
    base_url: String,
}

impl EvaluationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: default_http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Evaluator for EvaluationClient {
    async fn evaluate(&self, submission_text: &str) -> Result<EvaluationResult, ClientError> {
        ensure_submission(submission_text)?;

        let res = self
            .http
            .post(format!("{}{}", self.base_url, evaluate_route()))
            .json(&EvaluateRequest {
                submission_text: submission_text.to_string(),
            })
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            warn!(%status, "scoring service rejected evaluation request");
            return Err(ClientError::ServiceUnavailable(format!(
                "scoring service returned {status}"
            )));
        }

        let body: EvaluationResponse = res.json().await?;
        let result = EvaluationResult::try_from(body).map_err(|violation| {
            warn!(%violation, "scoring service returned an inconsistent rubric");
            ClientError::MalformedResponse(violation.to_string())
        })?;
        debug!(total_score = result.total_score(), "evaluation accepted");
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/evaluation_tests.rs"]
mod tests;
