//! # Event Waiter
//!
//! [`EventWaiter`] turns a [`WaitRequest`] into exactly one outcome: the first
//! email accepted by the request's predicate, or a [`WaitError::Timeout`] once
//! the deadline passes.
//!
//! ## How a wait runs
//!
//! 1. The deadline is fixed at invocation: `now + timeout`. A zero timeout
//!    fails right away, before anything is subscribed.
//! 2. A [`Subscription`] is opened for the mailbox (bounded by the deadline).
//! 3. Frames are decoded one by one. The predicate sees each candidate once;
//!    rejected candidates are traced and dropped.
//! 4. The first accepted email, the deadline, or a transport error settles the
//!    wait. The subscription is closed on every path, including when the
//!    caller drops the future halfway.
//!
//! There is no shared state between waits: each call owns its subscription and
//! its timer, so any number of waits can run side by side.

use super::handle::WaitHandle;
use super::state::{StateTracker, WaitState};
use crate::config::EtaConfig;
use crate::error::{ActionError, WaitError};
use crate::model::{EventRecord, Mailbox, WaitRequest};
use crate::transport::{PushTransport, Subscription};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

/// Timing defaults applied when a request does not say otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub default_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self::from(&EtaConfig::default())
    }
}

impl From<&EtaConfig> for WaitSettings {
    fn from(config: &EtaConfig) -> Self {
        Self {
            default_timeout: config.wait_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Waits for emails over a push or poll transport.
#[derive(Debug, Clone)]
pub struct EventWaiter<T> {
    pub(super) transport: T,
    pub(super) settings: WaitSettings,
}

impl<T> EventWaiter<T> {
    pub fn new(transport: T, settings: WaitSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> WaitSettings {
        self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn effective_timeout(&self, request: &WaitRequest) -> Duration {
        request.timeout.unwrap_or(self.settings.default_timeout)
    }
}

/// Fixes the deadline for a wait starting now.
pub(super) fn deadline_for(timeout: Duration) -> Result<Instant, WaitError> {
    if timeout.is_zero() {
        return Err(WaitError::Timeout(timeout));
    }
    Ok(Instant::now() + timeout)
}

impl<T: PushTransport> EventWaiter<T> {
    /// Resolves with the first email for `request.address` that the predicate
    /// accepts (any email when there is no predicate).
    #[instrument(skip(self, request), fields(address = %request.address))]
    pub async fn wait_for_matching_event(
        &self,
        request: WaitRequest,
    ) -> Result<EventRecord, WaitError> {
        self.wait_tracked(request, &StateTracker::detached()).await
    }

    pub(crate) async fn wait_tracked(
        &self,
        request: WaitRequest,
        tracker: &StateTracker,
    ) -> Result<EventRecord, WaitError> {
        let timeout = self.effective_timeout(&request);
        let result = async {
            let deadline = deadline_for(timeout)?;
            let subscription = self.open(&request.address, deadline, timeout).await?;
            tracker.set(WaitState::Listening);
            listen(subscription, &request, deadline, timeout).await
        }
        .await;
        tracker.settle(&result);
        result
    }

    /// Waits for a matching email while `action(address)` runs, typically the
    /// call that causes the email to be sent.
    ///
    /// The subscription is established before the action starts, so a fast
    /// action cannot beat the listener. The result is returned once both sides
    /// have finished. A failing action fails the whole operation with
    /// [`WaitError::ActionFailure`], even if the email already matched; the
    /// first failure on either side settles it.
    #[instrument(skip(self, request, action), fields(address = %request.address))]
    pub async fn wait_with_action<F, Fut, R, E>(
        &self,
        request: WaitRequest,
        action: F,
    ) -> Result<EventRecord, WaitError>
    where
        F: FnOnce(Mailbox) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<ActionError>,
    {
        let timeout = self.effective_timeout(&request);
        let deadline = deadline_for(timeout)?;
        let subscription = self.open(&request.address, deadline, timeout).await?;

        let address = request.address.clone();
        let waiting = listen(subscription, &request, deadline, timeout);
        let acting = async move {
            match action(address).await {
                Ok(_) => {
                    debug!("Concurrent action finished");
                    Ok(())
                }
                Err(e) => {
                    let error: ActionError = e.into();
                    warn!(error = %error, "Concurrent action failed");
                    Err(WaitError::ActionFailure(error))
                }
            }
        };

        let (event, ()) = tokio::try_join!(waiting, acting)?;
        Ok(event)
    }

    /// Opens the subscription, bounded by the request's deadline.
    async fn open(
        &self,
        address: &Mailbox,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Subscription, WaitError> {
        match time::timeout_at(deadline, self.transport.subscribe(address)).await {
            Ok(subscription) => {
                let subscription = subscription?;
                debug!(%address, "Push subscription open");
                Ok(subscription)
            }
            Err(_) => {
                warn!(%address, ?timeout, "Timed out opening push subscription");
                Err(WaitError::Timeout(timeout))
            }
        }
    }
}

impl<T: PushTransport + Clone + 'static> EventWaiter<T> {
    /// Runs the wait in its own task and hands back a [`WaitHandle`] that can
    /// observe or cancel it.
    pub fn spawn_wait(&self, request: WaitRequest) -> WaitHandle<EventRecord> {
        let waiter = self.clone();
        WaitHandle::spawn(move |tracker| async move { waiter.wait_tracked(request, &tracker).await })
    }
}

/// Races the subscription against the deadline, then releases it.
async fn listen(
    mut subscription: Subscription,
    request: &WaitRequest,
    deadline: Instant,
    timeout: Duration,
) -> Result<EventRecord, WaitError> {
    let outcome = time::timeout_at(deadline, next_match(&mut subscription, request)).await;
    subscription.close();
    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(address = %request.address, ?timeout, "Timed out waiting for email to arrive");
            Err(WaitError::Timeout(timeout))
        }
    }
}

async fn next_match(
    subscription: &mut Subscription,
    request: &WaitRequest,
) -> Result<EventRecord, WaitError> {
    let mut rejected = 0usize;
    loop {
        let event = subscription.next_event().await?;
        debug!(subject = %event.subject, "Incoming email");
        if request.accepts(&event) {
            info!(subject = %event.subject, rejected, "Email matched");
            return Ok(event);
        }
        rejected += 1;
        debug!(subject = %event.subject, rejected, "Predicate rejected email; still waiting");
    }
}
