use std::time::Duration;

use intake_core::Submission;
use intake_logging::intake_info;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::http::{build_client, map_reqwest_error};
use crate::settings::parse_endpoint;
use crate::{EngineSettings, FailureKind, SubmissionReceipt, TransferError};

/// The endpoint that receives a completed form.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, TransferError>;
}

/// Resolves successfully after a fixed round-trip delay.
#[derive(Debug, Clone)]
pub struct SimulatedSubmitter {
    delay: Duration,
}

impl SimulatedSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, TransferError> {
        tokio::time::sleep(self.delay).await;
        intake_info!(
            "simulated {} submission with {} fields accepted",
            submission.kind,
            submission.fields.len()
        );
        Ok(SubmissionReceipt { status: None })
    }
}

/// POSTs the submission as JSON.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpSubmitter {
    pub fn new(endpoint: &str, settings: &EngineSettings) -> Result<Self, TransferError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            client: build_client(settings)?,
        })
    }
}

#[async_trait::async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, TransferError> {
        let body = serde_json::to_vec(submission)
            .map_err(|err| TransferError::new(FailureKind::Encoding, err.to_string()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        intake_info!("{} submission accepted by {}", submission.kind, self.endpoint);
        Ok(SubmissionReceipt {
            status: Some(status.as_u16()),
        })
    }
}
