//! # Wait Handles
//!
//! A [`WaitHandle`] owns a wait running in its own Tokio task and is the
//! explicit cancel/dispose capability for it.
//!
//! Cancellation is cooperative: the task races the wait against a oneshot
//! signal. When the signal fires (or its sender is dropped together with the
//! handle), the wait future is dropped, which closes its subscription and
//! clears its timer. [`WaitHandle::cancel`] returns only once that happened.

use super::state::{StateTracker, WaitState};
use crate::error::WaitError;
use std::future::Future;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

pub struct WaitHandle<T> {
    cancel: oneshot::Sender<()>,
    state: watch::Receiver<WaitState>,
    task: JoinHandle<Option<Result<T, WaitError>>>,
}

impl<T: Send + 'static> WaitHandle<T> {
    pub(crate) fn spawn<F, Fut>(start: F) -> Self
    where
        F: FnOnce(StateTracker) -> Fut,
        Fut: Future<Output = Result<T, WaitError>> + Send + 'static,
    {
        let (tracker, state) = StateTracker::watched();
        let (cancel, mut cancelled) = oneshot::channel::<()>();
        let work = start(tracker.clone());

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracker.set(WaitState::Cancelled);
                    debug!("Wait cancelled");
                    None
                }
                result = work => Some(result),
            }
        });

        Self {
            cancel,
            state,
            task,
        }
    }
}

impl<T> WaitHandle<T> {
    /// Current state of the wait.
    pub fn state(&self) -> WaitState {
        *self.state.borrow()
    }

    /// Resolves once the wait has left `Idle`: its subscription is open, or it
    /// already settled.
    pub async fn listening(&mut self) -> WaitState {
        self.state
            .wait_for(|state| *state != WaitState::Idle)
            .await
            .map(|state| *state)
            .unwrap_or(WaitState::Cancelled)
    }

    /// A receiver of state transitions that outlives the handle.
    pub fn state_changes(&self) -> watch::Receiver<WaitState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abandons the wait. Returns after its subscription and timer have been
    /// released; the wait neither resolves nor rejects.
    pub async fn cancel(self) {
        let WaitHandle { cancel, task, .. } = self;
        let _ = cancel.send(());
        let _ = task.await;
    }

    /// Waits for the result.
    pub async fn outcome(self) -> Result<T, WaitError> {
        let WaitHandle { cancel, task, .. } = self;
        let joined = task.await;
        drop(cancel);
        match joined {
            Ok(Some(result)) => result,
            Ok(None) => Err(WaitError::Cancelled),
            Err(e) => Err(WaitError::TaskFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn outcome_returns_the_work_result() {
        let handle = WaitHandle::spawn(|tracker| async move {
            tracker.set(WaitState::Listening);
            let result: Result<u32, WaitError> = Ok(7);
            tracker.settle(&result);
            result
        });
        assert_eq!(handle.outcome().await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_work() {
        let (dropped_tx, dropped_rx) = oneshot::channel::<()>();
        let mut handle = WaitHandle::spawn(|tracker| async move {
            let _guard = dropped_tx;
            tracker.set(WaitState::Listening);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, WaitError>(())
        });

        assert_eq!(handle.listening().await, WaitState::Listening);
        handle.cancel().await;
        // The guard's sender was dropped with the work future.
        assert!(dropped_rx.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (dropped_tx, dropped_rx) = oneshot::channel::<()>();
        let handle = WaitHandle::spawn(|_tracker| async move {
            let _guard = dropped_tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, WaitError>(())
        });
        drop(handle);
        assert!(dropped_rx.await.is_err());
    }
}
