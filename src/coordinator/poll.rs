//! # Polling
//!
//! Fallback for when a push channel is unavailable or unwanted: fetch, and if
//! nothing is queued, sleep one interval and try again.
//!
//! The budget is accounted coarsely. Each empty round subtracts one poll
//! interval regardless of how long the fetch itself took, so the real elapsed
//! time can overshoot the budget by up to about one interval. Intervals below
//! [`MIN_POLL_INTERVAL`] are raised to it, so every empty round consumes budget.

use super::handle::WaitHandle;
use super::state::{StateTracker, WaitState};
use super::waiter::EventWaiter;
use crate::config::{Credentials, MIN_POLL_INTERVAL};
use crate::error::WaitError;
use crate::model::{EventBatch, Mailbox};
use crate::transport::PollTransport;
use std::time::Duration;
use tracing::{info, instrument, trace, warn};

impl<T: PollTransport> EventWaiter<T> {
    /// Polls `address` until a non-empty batch arrives or `budget` runs out.
    ///
    /// Transport errors are returned as-is on the first occurrence; only an
    /// empty answer is retried.
    #[instrument(skip(self, credentials))]
    pub async fn poll_for_events(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
        budget: Duration,
    ) -> Result<EventBatch, WaitError> {
        self.poll_tracked(credentials, address, budget, &StateTracker::detached())
            .await
    }

    pub(crate) async fn poll_tracked(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
        budget: Duration,
        tracker: &StateTracker,
    ) -> Result<EventBatch, WaitError> {
        let result = self.poll_loop(credentials, address, budget, tracker).await;
        tracker.settle(&result);
        result
    }

    async fn poll_loop(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
        budget: Duration,
        tracker: &StateTracker,
    ) -> Result<EventBatch, WaitError> {
        let interval = self.settings.poll_interval.max(MIN_POLL_INTERVAL);
        let mut remaining = budget;
        let mut rounds = 0u32;

        loop {
            if remaining.is_zero() {
                warn!(rounds, ?budget, "Polling timed out");
                return Err(WaitError::Timeout(budget));
            }

            tracker.set(WaitState::Listening);
            let batch = self.transport.fetch(credentials, address).await?;
            rounds += 1;

            if !batch.is_empty() {
                info!(rounds, emails = batch.len(), "Poll returned emails");
                return Ok(batch);
            }

            trace!(rounds, remaining_ms = remaining.as_millis() as u64, "Mailbox empty");
            tokio::time::sleep(interval).await;
            remaining = remaining.saturating_sub(interval);
        }
    }
}

impl<T: PollTransport + Clone + 'static> EventWaiter<T> {
    /// Runs [`poll_for_events`](Self::poll_for_events) in its own task.
    /// Cancelling the handle interrupts a pending sleep or fetch.
    pub fn spawn_poll(
        &self,
        credentials: Credentials,
        address: Mailbox,
        budget: Duration,
    ) -> WaitHandle<EventBatch> {
        let waiter = self.clone();
        WaitHandle::spawn(move |tracker| async move {
            waiter
                .poll_tracked(&credentials, &address, budget, &tracker)
                .await
        })
    }
}
