use crate::{
    models::metadata::MetadataError,
    services::workflow::WorkflowError,
};
use thiserror::Error;

/// Errors surfaced by the intake controller.
///
/// Validation failures (incomplete form, empty queue) and backend failures
/// are not errors: they are workflow outcomes. What lands here is misuse of
/// the session: an event the current state does not accept, or an edit to a
/// locked or unknown form field.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("form fields are locked while {0}")]
    MetadataLocked(&'static str),
}

impl IntakeError {
    /// True when the error only reflects an event arriving in the wrong state.
    pub fn is_rejected_event(&self) -> bool {
        matches!(self, Self::Workflow(_) | Self::MetadataLocked(_))
    }
}
