//! Workflow services: queue, state machine, submission, presentation and
//! the controller that wires them together for one session.

pub mod controller;
pub mod file_queue;
pub mod presenter;
pub mod reset_timer;
pub mod submission_client;
pub mod workflow;

pub use controller::{Controller, View};
pub use file_queue::FileQueue;
pub use presenter::{PresenterConfig, ResultPresenter, Summary};
pub use submission_client::{HttpSubmissionClient, UploadBackend};
pub use workflow::{Effect, WorkflowEvent, WorkflowState};
