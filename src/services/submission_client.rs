//! Multipart submission of one staged batch to the analysis backend.
//!
//! The client sends every form field as a text part and every staged file as
//! a binary part under one repeated field name, in queue order. It issues a
//! single request per call and never retries; transport faults, non-2xx
//! statuses and non-"success" bodies all come back as
//! [`SubmissionResult::Failure`].

use crate::{
    models::{FormMetadata, StagedFile, SubmissionResult, UploadResponse},
    services::file_queue::FileQueue,
};
use async_trait::async_trait;
use reqwest::{
    Body, Client, StatusCode,
    multipart::{Form, Part},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_FILE_FIELD: &str = "metric_images[]";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Anything able to take a form + queue and report the outcome.
///
/// Implementations must not mutate their inputs; the workflow alone decides
/// when the queue and form are cleared.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn submit(&self, metadata: &FormMetadata, queue: &FileQueue) -> SubmissionResult;
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("could not reach the analysis service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to read the server response: {0}")]
    Body(#[source] reqwest::Error),
    #[error("the server response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `reqwest`-backed client for `POST /upload`.
#[derive(Clone, Debug)]
pub struct HttpSubmissionClient {
    client: Client,
    endpoint: String,
    file_field: String,
}

impl HttpSubmissionClient {
    pub fn new(
        endpoint: impl Into<String>,
        file_field: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SubmissionError::Client)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            file_field: file_field.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the multipart body: form fields first, then files in queue order.
    pub fn build_form(&self, metadata: &FormMetadata, queue: &FileQueue) -> Form {
        let form = metadata.fields().fold(Form::new(), |form, (spec, value)| {
            form.text(spec.name.clone(), value.to_string())
        });
        queue.iter().fold(form, |form, file| {
            form.part(self.file_field.clone(), file_part(file))
        })
    }

    async fn send(
        &self,
        metadata: &FormMetadata,
        queue: &FileQueue,
    ) -> Result<(StatusCode, Option<UploadResponse>), SubmissionError> {
        let form = self.build_form(metadata, queue);
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(SubmissionError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(SubmissionError::Body)?;

        match serde_json::from_slice::<UploadResponse>(&body) {
            Ok(parsed) => Ok((status, Some(parsed))),
            // An error page without a JSON body still fails with the fallback text.
            Err(_) if !status.is_success() => Ok((status, None)),
            Err(err) => Err(SubmissionError::Decode(err)),
        }
    }
}

#[async_trait]
impl UploadBackend for HttpSubmissionClient {
    async fn submit(&self, metadata: &FormMetadata, queue: &FileQueue) -> SubmissionResult {
        info!(
            endpoint = %self.endpoint,
            files = queue.len(),
            bytes = queue.total_bytes(),
            "submitting batch"
        );

        match self.send(metadata, queue).await {
            Ok((status, body)) => {
                let result = SubmissionResult::from_response(status.is_success(), body);
                if let SubmissionResult::Failure { message } = &result {
                    warn!(%status, "submission rejected: {}", message);
                }
                result
            }
            Err(err) => {
                warn!("submission failed: {}", err);
                SubmissionResult::failure(err.to_string())
            }
        }
    }
}

fn file_part(file: &StagedFile) -> Part {
    let build = || {
        Part::stream_with_length(Body::from(file.content.clone()), file.size)
            .file_name(file.name.clone())
    };
    build()
        .mime_str(&file.media_type)
        .or_else(|_| build().mime_str(FALLBACK_MEDIA_TYPE))
        .unwrap_or_else(|_| build())
}
