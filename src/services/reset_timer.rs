//! One-shot, cancellable auto-reset armed after a successful submission.
//!
//! When the dwell elapses the timer sends its generation number on a
//! channel; the receiver turns it into an `AutoResetFired` event. Cancelling
//! stops the sleeping task, so a manual reset never races a second one.

use std::time::Duration;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_DWELL: Duration = Duration::from_secs(15);

struct Armed {
    generation: u64,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ResetTimer {
    dwell: Duration,
    tx: UnboundedSender<u64>,
    armed: Option<Armed>,
}

impl ResetTimer {
    /// Create a timer and the receiver its firings arrive on.
    pub fn new(dwell: Duration) -> (Self, UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            dwell,
            tx,
            armed: None,
        };
        (timer, rx)
    }

    /// Start the countdown for `generation`, replacing any armed countdown.
    pub fn arm(&mut self, generation: u64) {
        self.cancel();

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let tx = self.tx.clone();
        let dwell = self.dwell;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "auto reset cancelled");
                }
                _ = sleep(dwell) => {
                    // The receiver is gone once the session ends.
                    let _ = tx.send(generation);
                }
            }
        });

        debug!(generation, dwell_ms = dwell.as_millis() as u64, "auto reset armed");
        self.armed = Some(Armed {
            generation,
            cancel_token,
            handle,
        });
    }

    /// Cancel the armed countdown. Returns false when nothing was armed.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                armed.cancel_token.cancel();
                !armed.handle.is_finished()
            }
            None => false,
        }
    }

    /// Generation of the pending countdown, if one is still running.
    pub fn pending(&self) -> Option<u64> {
        self.armed
            .as_ref()
            .filter(|armed| !armed.handle.is_finished())
            .map(|armed| armed.generation)
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
