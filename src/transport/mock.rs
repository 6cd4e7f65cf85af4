//! # Mock Transports & Testing Guide
//!
//! Scripted stand-ins for the transport traits. They run entirely in-memory
//! and never spawn tasks, which makes them the tool of choice for exercising
//! the waiter's timing and error paths deterministically.
//!
//! ## When to use Mocks vs the Simulated Service
//!
//! | Feature | Mocks | [`MailService`](crate::service::MailService) |
//! |---------|-------|-------------------|
//! | **Speed** | Instant | Fast (one actor task) |
//! | **Determinism** | You decide every answer | Real fan-out and queueing |
//! | **Error Injection** | Easy (`return_err`, `fail_next_subscribe`) | Only auth / unknown address |
//! | **Use Case** | Waiter edge cases | End-to-end helper flows |
//!
//! ## Scripting a poll endpoint
//!
//! ```rust
//! use eta_wait::config::Credentials;
//! use eta_wait::model::{EventBatch, EventRecord, Mailbox};
//! use eta_wait::transport::mock::MockPollEndpoint;
//! use eta_wait::transport::PollTransport;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut endpoint = MockPollEndpoint::new();
//!     endpoint.expect_fetch().return_empty();
//!     endpoint
//!         .expect_fetch()
//!         .return_batch(EventBatch::new(vec![EventRecord::new("hi")]));
//!
//!     let credentials = Credentials::new("key", "secret");
//!     let mailbox = Mailbox::parse("inbox@example.test").unwrap();
//!
//!     assert!(endpoint.fetch(&credentials, &mailbox).await.unwrap().is_empty());
//!     assert_eq!(endpoint.fetch(&credentials, &mailbox).await.unwrap().len(), 1);
//!     endpoint.verify();
//! }
//! ```
//!
//! ## Driving a push channel by hand
//!
//! [`MockPushTransport`] hands out real [`Subscription`]s and keeps their
//! senders, so a test can push frames (valid or not), hang up the remote end,
//! or check that the waiter released its channel.

use super::subscription::FrameSender;
use super::{PollTransport, PushTransport, Subscription};
use crate::config::Credentials;
use crate::error::TransportError;
use crate::model::{EventBatch, EventRecord, Mailbox, PushFrame};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// POLL ENDPOINT
// =============================================================================

type FetchQueue = Arc<Mutex<VecDeque<Result<EventBatch, TransportError>>>>;

/// A poll endpoint answering from a queue of expectations.
///
/// Clones share the queue, so a test can keep one handle for `verify()` and
/// give another to the waiter.
#[derive(Clone, Default)]
pub struct MockPollEndpoint {
    expectations: FetchQueue,
    calls: Arc<AtomicUsize>,
}

impl MockPollEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one more `fetch` call.
    pub fn expect_fetch(&mut self) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all fetch expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl PollTransport for MockPollEndpoint {
    async fn fetch(
        &self,
        _credentials: &Credentials,
        _address: &Mailbox,
    ) -> Result<EventBatch, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.expectations.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => panic!("Unexpected fetch: no expectation left"),
        }
    }
}

/// Builder for `fetch` expectations.
pub struct FetchExpectationBuilder {
    expectations: FetchQueue,
}

impl FetchExpectationBuilder {
    pub fn return_empty(self) {
        self.return_batch(EventBatch::default());
    }

    pub fn return_batch(self, batch: EventBatch) {
        self.expectations.lock().unwrap().push_back(Ok(batch));
    }

    pub fn return_err(self, error: TransportError) {
        self.expectations.lock().unwrap().push_back(Err(error));
    }
}

// =============================================================================
// PUSH TRANSPORT
// =============================================================================

#[derive(Default)]
struct PushState {
    failures: VecDeque<TransportError>,
    senders: Vec<(Mailbox, FrameSender)>,
    subscribe_calls: usize,
}

/// A push transport whose frames are sent by the test itself.
#[derive(Clone, Default)]
pub struct MockPushTransport {
    state: Arc<Mutex<PushState>>,
}

impl MockPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `subscribe` call fail with `error`.
    pub fn fail_next_subscribe(&mut self, error: TransportError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    /// Sends `event` to every open subscription of `address`.
    /// Returns how many subscriptions received it.
    pub fn send(&self, address: &Mailbox, event: &EventRecord) -> usize {
        let raw = PushFrame::encode(event).expect("event records always serialize");
        self.send_raw(address, &raw)
    }

    /// Sends an arbitrary frame, valid or not. Released subscriptions are
    /// forgotten along the way.
    pub fn send_raw(&self, address: &Mailbox, raw: &str) -> usize {
        let mut delivered = 0;
        self.state
            .lock()
            .unwrap()
            .senders
            .retain(|(mailbox, sender)| {
                if mailbox != address {
                    return !sender.is_closed();
                }
                let sent = sender.send(raw.to_string()).is_ok();
                delivered += usize::from(sent);
                sent
            });
        delivered
    }

    /// Simulates the remote end closing every channel of `address`.
    pub fn hang_up(&self, address: &Mailbox) {
        self.state
            .lock()
            .unwrap()
            .senders
            .retain(|(mailbox, _)| mailbox != address);
    }

    /// Subscriptions of `address` the consumer has not released yet.
    pub fn open_subscriptions(&self, address: &Mailbox) -> usize {
        self.state
            .lock()
            .unwrap()
            .senders
            .iter()
            .filter(|(mailbox, sender)| mailbox == address && !sender.is_closed())
            .count()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().unwrap().subscribe_calls
    }
}

#[async_trait]
impl PushTransport for MockPushTransport {
    async fn subscribe(&self, address: &Mailbox) -> Result<Subscription, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.subscribe_calls += 1;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        let (sender, subscription) = Subscription::channel(address.clone());
        state.senders.retain(|(_, sender)| !sender.is_closed());
        state.senders.push((address.clone(), sender));
        Ok(subscription)
    }
}
