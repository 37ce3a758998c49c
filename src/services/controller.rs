//! Controller owning one intake session.
//!
//! Every user action becomes a [`WorkflowEvent`]; the pure state machine
//! decides the next state and effects, and the controller carries those
//! effects out against the queue, the form, the timer and the [`View`].
//! All entry points take `&mut self`, so no two events ever interleave, and
//! the in-flight submission keeps the controller borrowed until it settles.

use crate::{
    errors::IntakeError,
    models::{FieldSpec, FileKey, FormMetadata, FormSchema, StagedFile, SubmissionResult},
    services::{
        file_queue::FileQueue,
        presenter::{ResultPresenter, Summary},
        reset_timer::ResetTimer,
        submission_client::UploadBackend,
        workflow::{self, Effect, GuardContext, StatusMessage, WorkflowEvent, WorkflowState},
    },
};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};
use tracing::{debug, info};
use uuid::Uuid;

/// Output side of the session: whatever shows the form, list and summary.
///
/// Every method has a no-op default so adapters implement only what they
/// actually display.
pub trait View {
    fn set_metadata_locked(&mut self, _locked: bool) {}
    fn clear_form(&mut self) {}
    fn set_title(&mut self, _title: &str) {}
    fn show_validation_errors(&mut self, _missing: &[FieldSpec]) {}
    fn set_staging_visible(&mut self, _visible: bool) {}
    fn render_file_list(&mut self, _files: &[FileKey]) {}
    fn set_submit_visible(&mut self, _visible: bool) {}
    fn set_submit_enabled(&mut self, _enabled: bool) {}
    fn notice(&mut self, _text: &str) {}
    fn show_status(&mut self, _status: &StatusMessage) {}
    fn hide_status(&mut self) {}
    fn show_summary(&mut self, _summary: &Summary) {}
    fn hide_summary(&mut self) {}
}

pub struct Controller<B, V> {
    session_id: Uuid,
    state: WorkflowState,
    queue: FileQueue,
    metadata: FormMetadata,
    presenter: ResultPresenter,
    backend: B,
    view: V,
    timer: ResetTimer,
    timer_rx: UnboundedReceiver<u64>,
    reset_generation: u64,
}

impl<B, V> Controller<B, V>
where
    B: UploadBackend,
    V: View,
{
    /// Start a session in `Editing` with an empty form built from `schema`.
    pub fn new(
        backend: B,
        view: V,
        schema: FormSchema,
        presenter: ResultPresenter,
        dwell: Duration,
    ) -> Self {
        let (timer, timer_rx) = ResetTimer::new(dwell);
        let session_id = Uuid::new_v4();
        info!(session = %session_id, "intake session started");

        Self {
            session_id,
            state: WorkflowState::Editing,
            queue: FileQueue::new(),
            metadata: FormMetadata::new(schema),
            presenter,
            backend,
            view,
            timer,
            timer_rx,
            reset_generation: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn queue(&self) -> &FileQueue {
        &self.queue
    }

    pub fn metadata(&self) -> &FormMetadata {
        &self.metadata
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generation of the armed auto-reset, if one is still counting down.
    pub fn pending_auto_reset(&self) -> Option<u64> {
        self.timer.pending()
    }

    /// Edit one form field. Only allowed while editing.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), IntakeError> {
        if self.state != WorkflowState::Editing {
            return Err(IntakeError::MetadataLocked(self.state.name()));
        }
        self.metadata.set(name, value)?;
        Ok(())
    }

    /// Validate the form and, if complete, lock it and open staging.
    pub fn prepare(&mut self) -> Result<Vec<Effect>, IntakeError> {
        self.dispatch(WorkflowEvent::Prepare)
    }

    pub fn add_files(&mut self, files: Vec<StagedFile>) -> Result<Vec<Effect>, IntakeError> {
        self.dispatch(WorkflowEvent::AddFiles(files))
    }

    pub fn remove_file(&mut self, key: FileKey) -> Result<Vec<Effect>, IntakeError> {
        self.dispatch(WorkflowEvent::RemoveFile(key))
    }

    /// Submit the staged batch.
    ///
    /// With an empty queue this only shows a notice and never reaches the
    /// backend. Otherwise it awaits the single request and dispatches its
    /// outcome, returning the effects of both steps.
    pub async fn submit(&mut self) -> Result<Vec<Effect>, IntakeError> {
        let mut effects = self.dispatch(WorkflowEvent::Submit)?;
        if !effects.contains(&Effect::StartSubmission) {
            return Ok(effects);
        }

        let outcome = self.backend.submit(&self.metadata, &self.queue).await;
        let event = match outcome {
            SubmissionResult::Success(payload) => {
                WorkflowEvent::SubmissionSucceeded(self.presenter.present(&payload))
            }
            SubmissionResult::Failure { message } => WorkflowEvent::SubmissionFailed(message),
        };
        effects.extend(self.dispatch(event)?);
        Ok(effects)
    }

    /// Return to an empty form. Always cancels a pending auto-reset.
    pub fn reset(&mut self) -> Result<Vec<Effect>, IntakeError> {
        self.dispatch(WorkflowEvent::Reset)
    }

    /// Dispatch any auto-reset firings already delivered, without waiting.
    ///
    /// Returns true when one of them reset the session.
    pub fn poll_auto_reset(&mut self) -> Result<bool, IntakeError> {
        let mut reset = false;
        loop {
            match self.timer_rx.try_recv() {
                Ok(generation) => reset |= self.fire_auto_reset(generation)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(reset)
    }

    /// Wait for the armed auto-reset and dispatch it.
    ///
    /// Returns false at once when nothing is armed, e.g. after a manual reset.
    pub async fn wait_for_auto_reset(&mut self) -> Result<bool, IntakeError> {
        if self.poll_auto_reset()? {
            return Ok(true);
        }
        if self.timer.pending().is_none() {
            // The countdown may have finished between the poll and this check.
            return self.poll_auto_reset();
        }
        match self.timer_rx.recv().await {
            Some(generation) => self.fire_auto_reset(generation),
            None => Ok(false),
        }
    }

    fn fire_auto_reset(&mut self, generation: u64) -> Result<bool, IntakeError> {
        let before = self.state.clone();
        self.dispatch(WorkflowEvent::AutoResetFired(generation))?;
        Ok(before != self.state)
    }

    fn guard_context(&self) -> GuardContext {
        GuardContext {
            missing_fields: self.metadata.missing(),
            title: self.metadata.title_value().to_string(),
            queue_len: self.queue.len(),
            next_reset_generation: self.reset_generation + 1,
        }
    }

    fn dispatch(&mut self, event: WorkflowEvent) -> Result<Vec<Effect>, IntakeError> {
        let event_name = event.name();
        let ctx = self.guard_context();
        let transition = workflow::transition(&self.state, event, &ctx)?;

        if transition.changed_from(&self.state) {
            info!(
                session = %self.session_id,
                event = event_name,
                from = %self.state,
                to = %transition.next,
                "workflow transition"
            );
        } else {
            debug!(
                session = %self.session_id,
                event = event_name,
                state = %self.state,
                "no transition"
            );
        }

        if let WorkflowState::Success { reset_generation } = transition.next {
            self.reset_generation = reset_generation;
        }
        self.state = transition.next;

        for effect in &transition.effects {
            self.apply(effect);
        }
        Ok(transition.effects)
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::LockMetadata => self.view.set_metadata_locked(true),
            Effect::UnlockMetadata => self.view.set_metadata_locked(false),
            Effect::ClearMetadata => {
                self.metadata.clear();
                self.view.clear_form();
            }
            Effect::SetTitle(title) => self.view.set_title(title),
            Effect::ShowValidationErrors(missing) => self.view.show_validation_errors(missing),
            Effect::ShowStaging => self.view.set_staging_visible(true),
            Effect::HideStaging => self.view.set_staging_visible(false),
            Effect::StageFiles(files) => {
                let added = self.queue.add(files.iter().cloned());
                debug!(
                    session = %self.session_id,
                    added,
                    skipped = files.len() - added,
                    queued = self.queue.len(),
                    "files staged"
                );
            }
            Effect::UnstageFile(key) => {
                let removed = self.queue.remove(key);
                debug!(session = %self.session_id, %key, removed, "file unstaged");
            }
            Effect::ClearQueue => self.queue.clear(),
            Effect::RenderFileList => {
                self.view.render_file_list(&self.queue.keys());
                self.view.set_submit_visible(!self.queue.is_empty());
            }
            Effect::SetSubmitEnabled(enabled) => self.view.set_submit_enabled(*enabled),
            Effect::Notice(text) => self.view.notice(text),
            Effect::ShowStatus(status) => self.view.show_status(status),
            Effect::HideStatus => self.view.hide_status(),
            // Carried out by `submit`, which owns the await.
            Effect::StartSubmission => {}
            Effect::ShowSummary(summary) => self.view.show_summary(summary),
            Effect::HideSummary => self.view.hide_summary(),
            Effect::ArmAutoReset(generation) => self.timer.arm(*generation),
            Effect::CancelAutoReset => {
                if self.timer.cancel() {
                    debug!(session = %self.session_id, "pending auto reset cancelled");
                }
            }
        }
    }
}
