//! Cancellable turn timeout.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::TurnExpired;

/// One pending turn timeout, at most.
///
/// Arming spawns a task that sleeps for the timeout and then posts a
/// [`TurnExpired`] notice. Re-arming or cancelling aborts the pending task
/// first, and so does dropping the timer.
#[derive(Debug, Default)]
pub struct TurnTimer {
    pending: Option<JoinHandle<()>>,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `notice` on `tx` after `delay`, replacing any pending
    /// timeout. Must be called inside a Tokio runtime.
    pub fn arm(
        &mut self,
        delay: Duration,
        tx: mpsc::UnboundedSender<TurnExpired>,
        notice: TurnExpired,
    ) {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!(
                session = %notice.session,
                slot = %notice.slot,
                turn = notice.turn,
                "turn timer fired"
            );
            // The lobby may already be gone at shutdown.
            let _ = tx.send(notice);
        }));
    }

    /// Drops the pending timeout, if any. Safe to call repeatedly and after
    /// the timeout has already fired.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a timeout is scheduled and hasn't fired.
    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
