//! Response of the analysis backend and its interpretation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Status marker the backend uses for a fully processed batch.
pub const SUCCESS_STATUS: &str = "success";

/// Message used when a failure carries no server-supplied text.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Unknown server error.";

/// JSON body returned by `POST /upload`, as sent on the wire.
///
/// Every field is optional so that partial or unexpected bodies still decode
/// and can be judged by [`SubmissionResult::from_response`].
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UploadResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub processed_data: Option<ProcessedData>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProcessedData {
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    pub drive_folder_link: Option<String>,
}

/// Extracted metrics plus the link to the stored screenshots.
///
/// A metric mapped to `None` was reported as `null`; a metric missing from the
/// map was not reported at all. Both mean "absent" and neither is zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SuccessPayload {
    pub metrics: BTreeMap<String, Option<f64>>,
    pub storage_link: Option<String>,
}

impl SuccessPayload {
    /// Value of a metric when it was reported with a number.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}

impl From<ProcessedData> for SuccessPayload {
    fn from(data: ProcessedData) -> Self {
        let metrics = data
            .metrics
            .into_iter()
            .map(|(name, value)| {
                let number = match &value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                (name, number.filter(|n| n.is_finite()))
            })
            .collect();

        Self {
            metrics,
            storage_link: data.drive_folder_link.filter(|link| !link.is_empty()),
        }
    }
}

/// Outcome of one submission, as seen by the workflow.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionResult {
    Success(SuccessPayload),
    Failure { message: String },
}

impl SubmissionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Judge a settled HTTP exchange.
    ///
    /// Success requires both a 2xx status and `status == "success"` in the body.
    /// Anything else is a failure carrying the server `message`, or the
    /// fallback text when none was sent.
    pub fn from_response(http_ok: bool, body: Option<UploadResponse>) -> Self {
        let body = body.unwrap_or_default();
        if http_ok && body.status.as_deref() == Some(SUCCESS_STATUS) {
            return Self::Success(body.processed_data.unwrap_or_default().into());
        }

        let message = body
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string());
        Self::Failure { message }
    }
}
