//! Workflow state machine for one intake session.
//!
//! [`transition`] is a pure function of the current state, an event and the
//! guard inputs. It returns the next state and the ordered list of effects
//! the caller must carry out; nothing here touches the queue, the form, the
//! network or a timer directly.
//!
//! ```text
//! Editing --prepare--> Staging --submit--> Submitting --ok--> Success --reset--> Editing
//!                        ^                     |
//!                        +------ Error <--fail-+
//! ```

use crate::models::{FieldSpec, FileKey, StagedFile};
use crate::services::presenter::Summary;
use std::fmt;
use thiserror::Error;

pub const INITIAL_TITLE: &str = "Register Content";
pub const EMPTY_QUEUE_NOTICE: &str = "Please select or drop at least one screenshot.";

pub fn staging_title(campaign: &str) -> String {
    format!("Uploading for: {}", campaign)
}

pub fn in_flight_status(count: usize) -> String {
    format!("Sending {} images for analysis...", count)
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Metadata is editable; no file activity.
    Editing,
    /// Metadata is locked; files can be added and removed.
    Staging,
    /// A submission is in flight; only its outcome is accepted.
    Submitting,
    /// A summary is shown until the auto-reset tagged `reset_generation` fires.
    Success { reset_generation: u64 },
    /// The last submission failed. Behaves like `Staging`.
    Error { message: String },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Staging => "staging",
            Self::Submitting => "submitting",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    /// True for `Staging` and for `Error`, which stands in for it.
    pub fn is_staging(&self) -> bool {
        matches!(self, Self::Staging | Self::Error { .. })
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    Prepare,
    AddFiles(Vec<StagedFile>),
    RemoveFile(FileKey),
    Submit,
    SubmissionSucceeded(Summary),
    SubmissionFailed(String),
    Reset,
    AutoResetFired(u64),
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::AddFiles(_) => "add files",
            Self::RemoveFile(_) => "remove file",
            Self::Submit => "submit",
            Self::SubmissionSucceeded(_) => "submission succeeded",
            Self::SubmissionFailed(_) => "submission failed",
            Self::Reset => "reset",
            Self::AutoResetFired(_) => "auto reset",
        }
    }
}

/// Read-only facts the guards need, sampled by the caller before dispatch.
#[derive(Debug, Clone, Default)]
pub struct GuardContext {
    /// Required fields that are currently empty.
    pub missing_fields: Vec<FieldSpec>,
    /// Value of the form's title field.
    pub title: String,
    pub queue_len: usize,
    /// Generation to tag the auto-reset with if this event arms one.
    pub next_reset_generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(text) => f.write_str(text),
            Self::Error(text) => write!(f, "Error: {}", text),
        }
    }
}

/// Work the caller performs after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LockMetadata,
    UnlockMetadata,
    ClearMetadata,
    SetTitle(String),
    ShowValidationErrors(Vec<FieldSpec>),
    ShowStaging,
    HideStaging,
    StageFiles(Vec<StagedFile>),
    UnstageFile(FileKey),
    ClearQueue,
    /// Re-render the file list and set submit visibility from the queue.
    RenderFileList,
    SetSubmitEnabled(bool),
    Notice(String),
    ShowStatus(StatusMessage),
    HideStatus,
    StartSubmission,
    ShowSummary(Summary),
    HideSummary,
    ArmAutoReset(u64),
    CancelAutoReset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: WorkflowState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: WorkflowState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn stay(state: &WorkflowState, effects: Vec<Effect>) -> Self {
        Self {
            next: state.clone(),
            effects,
        }
    }

    pub fn changed_from(&self, state: &WorkflowState) -> bool {
        &self.next != state
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("`{event}` is not accepted while {state}")]
    Rejected {
        state: &'static str,
        event: &'static str,
    },
}

fn reset_effects(cancel_timer: bool) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(11);
    if cancel_timer {
        effects.push(Effect::CancelAutoReset);
    }
    effects.extend([
        Effect::ClearQueue,
        Effect::ClearMetadata,
        Effect::UnlockMetadata,
        Effect::SetTitle(INITIAL_TITLE.to_string()),
        Effect::HideSummary,
        Effect::HideStaging,
        Effect::HideStatus,
        Effect::RenderFileList,
        Effect::SetSubmitEnabled(true),
    ]);
    effects
}

/// Compute the next state and effects for `event` in `state`.
///
/// Guard failures (incomplete form, empty queue) are not errors: the state is
/// kept and the effects describe the notice to show. Events that make no
/// sense in `state` are rejected and must leave the caller's state untouched.
pub fn transition(
    state: &WorkflowState,
    event: WorkflowEvent,
    ctx: &GuardContext,
) -> Result<Transition, WorkflowError> {
    use WorkflowEvent as Ev;
    use WorkflowState as St;

    let transition = match (state, event) {
        (St::Editing, Ev::Prepare) => {
            if ctx.missing_fields.is_empty() {
                Transition::to(
                    St::Staging,
                    vec![
                        Effect::LockMetadata,
                        Effect::SetTitle(staging_title(&ctx.title)),
                        Effect::ShowStaging,
                        Effect::RenderFileList,
                    ],
                )
            } else {
                Transition::stay(
                    state,
                    vec![Effect::ShowValidationErrors(ctx.missing_fields.clone())],
                )
            }
        }

        (current, Ev::AddFiles(files)) if current.is_staging() => Transition::to(
            St::Staging,
            vec![Effect::StageFiles(files), Effect::RenderFileList],
        ),

        (current, Ev::RemoveFile(key)) if current.is_staging() => Transition::to(
            St::Staging,
            vec![Effect::UnstageFile(key), Effect::RenderFileList],
        ),

        (current, Ev::Submit) if current.is_staging() => {
            if ctx.queue_len == 0 {
                Transition::stay(state, vec![Effect::Notice(EMPTY_QUEUE_NOTICE.to_string())])
            } else {
                Transition::to(
                    St::Submitting,
                    vec![
                        Effect::SetSubmitEnabled(false),
                        Effect::ShowStatus(StatusMessage::Info(in_flight_status(ctx.queue_len))),
                        Effect::StartSubmission,
                    ],
                )
            }
        }

        (St::Submitting, Ev::SubmissionSucceeded(summary)) => {
            let generation = ctx.next_reset_generation;
            Transition::to(
                St::Success {
                    reset_generation: generation,
                },
                vec![
                    Effect::HideStatus,
                    Effect::HideStaging,
                    Effect::ShowSummary(summary),
                    Effect::ArmAutoReset(generation),
                ],
            )
        }

        (St::Submitting, Ev::SubmissionFailed(message)) => Transition::to(
            St::Error {
                message: message.clone(),
            },
            vec![
                Effect::ShowStatus(StatusMessage::Error(message)),
                Effect::SetSubmitEnabled(true),
            ],
        ),

        (St::Success { .. } | St::Staging | St::Error { .. }, Ev::Reset) => {
            Transition::to(St::Editing, reset_effects(true))
        }

        (St::Editing, Ev::Reset) => Transition::stay(state, Vec::new()),

        (St::Success { reset_generation }, Ev::AutoResetFired(generation))
            if *reset_generation == generation =>
        {
            Transition::to(St::Editing, reset_effects(false))
        }

        // A timer that was cancelled, superseded, or outlived a manual reset.
        (_, Ev::AutoResetFired(_)) => Transition::stay(state, Vec::new()),

        (state, event) => {
            return Err(WorkflowError::Rejected {
                state: state.name(),
                event: event.name(),
            });
        }
    };

    Ok(transition)
}
