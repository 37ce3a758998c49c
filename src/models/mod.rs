//! Core data models for the metrics intake workflow.
//!
//! These types describe what the user stages (files and form values) and
//! what the analysis backend sends back. Wire-facing types derive `serde`.

pub mod metadata;
pub mod staged_file;
pub mod submission;

pub use metadata::{FieldSpec, FormMetadata, FormSchema};
pub use staged_file::{FileKey, StagedFile};
pub use submission::{SubmissionResult, SuccessPayload, UploadResponse};
