use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Patient, PatientId, Session},
    protocol::{homeworks_route, patients_route, sessions_route, HomeworkRecord, NewHomework},
};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    evaluation::{default_http_client, http_client},
};

/// Client for the homework persistence service. Patient filtering happens on
/// the client because the service only exposes unfiltered listings.
pub struct HomeworkServiceClient {
    http: Client,
    base_url: String,
}

impl HomeworkServiceClient {
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

    pub async fn list_patients(&self) -> Result<Vec<Patient>, ClientError> {
        self.get_json(patients_route()).await
    }

    pub async fn list_sessions(&self, patient_id: PatientId) -> Result<Vec<Session>, ClientError> {
        let sessions: Vec<Session> = self.get_json(sessions_route()).await?;
        Ok(sessions
            .into_iter()
            .filter(|session| session.patient_id == patient_id)
            .collect())
    }

    pub async fn fetch_homeworks(
        &self,
        patient_id: Option<PatientId>,
    ) -> Result<Vec<HomeworkRecord>, ClientError> {
        let records: Vec<HomeworkRecord> = self.get_json(homeworks_route()).await?;
        Ok(match patient_id {
            Some(patient_id) => records
                .into_iter()
                .filter(|record| record.patient_id == patient_id)
                .collect(),
            None => records,
        })
    }

    pub async fn submit_homework(&self, draft: &NewHomework) -> Result<HomeworkRecord, ClientError> {
        let content_empty = draft
            .submission
            .as_ref()
            .map_or(true, |submission| submission.content.trim().is_empty());
        if content_empty {
            return Err(ClientError::EmptySubmission);
        }

        let res = self
            .http
            .post(format!("{}{}", self.base_url, homeworks_route()))
            .json(draft)
            .send()
            .await?;
        let record: HomeworkRecord = decode(res).await?;
        info!(
            homework_id = record.id,
            patient_id = %record.patient_id,
            "homework submission stored"
        );
        Ok(record)
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, ClientError> {
        let res = self
            .http
            .get(format!("{}{}", self.base_url, route))
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        warn!(%status, %body, "homework service request failed");
        return Err(ClientError::ServiceUnavailable(format!(
            "homework service returned {status}"
        )));
    }
    Ok(res.json().await?)
}

#[cfg(test)]
#[path = "tests/homework_api_tests.rs"]
mod tests;
