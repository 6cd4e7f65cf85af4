use crate::error::WaitError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Lifecycle of one wait request.
///
/// `Idle -> Listening -> {Matched, TimedOut, Errored}`, with `Cancelled`
/// reachable from any non-terminal state of a spawned wait. Terminal states
/// are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Idle,
    /// Subscription open (or poll loop running).
    Listening,
    Matched,
    TimedOut,
    Errored,
    Cancelled,
}

impl WaitState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WaitState::Idle | WaitState::Listening)
    }
}

/// Publishes state transitions to a [`WaitHandle`](super::WaitHandle), if any.
#[derive(Clone)]
pub(crate) struct StateTracker {
    sender: Option<Arc<watch::Sender<WaitState>>>,
}

impl StateTracker {
    /// For plain `async fn` waits nobody observes.
    pub(crate) fn detached() -> Self {
        Self { sender: None }
    }

    pub(crate) fn watched() -> (Self, watch::Receiver<WaitState>) {
        let (sender, receiver) = watch::channel(WaitState::Idle);
        let tracker = Self {
            sender: Some(Arc::new(sender)),
        };
        (tracker, receiver)
    }

    pub(crate) fn set(&self, next: WaitState) {
        let Some(sender) = &self.sender else {
            return;
        };
        sender.send_if_modified(|current| {
            if current.is_terminal() || *current == next {
                return false;
            }
            trace!(from = ?*current, to = ?next, "Wait state changed");
            *current = next;
            true
        });
    }

    /// Moves to the terminal state matching `result`.
    pub(crate) fn settle<T>(&self, result: &Result<T, WaitError>) {
        self.set(match result {
            Ok(_) => WaitState::Matched,
            Err(WaitError::Timeout(_)) => WaitState::TimedOut,
            Err(_) => WaitState::Errored,
        });
    }
}
