use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("submission text is empty")]
    EmptySubmission,
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("malformed evaluation response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Retrying means re-invoking the same operation; the clients never retry
    /// on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::ServiceUnavailable(_) | ClientError::MalformedResponse(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::EmptySubmission => "There is no submission text to evaluate.",
            ClientError::ServiceUnavailable(_) | ClientError::MalformedResponse(_) => {
                "The service is temporarily unavailable, please retry."
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ClientError::MalformedResponse(value.to_string())
        } else {
            ClientError::ServiceUnavailable(value.to_string())
        }
    }
}
