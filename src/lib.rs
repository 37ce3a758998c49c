//! Screenshot intake workflow for campaign content metrics.
//!
//! A session moves from editing campaign metadata, to staging screenshots,
//! to submitting them as one multipart request, to showing the extracted
//! metrics (or an error) before returning to an empty form.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

pub use errors::IntakeError;
