//! # Simulated Mail Service
//!
//! An in-memory stand-in for the email test automation service, built as an
//! actor: [`MailService`] owns every mailbox and processes
//! [`ServiceRequest`]s one at a time, so its state needs no locks.
//!
//! For each mailbox the service keeps:
//!
//! - a **queue** of delivered emails, drained by `Fetch` (the poll endpoint)
//!   and capped at [`MAX_QUEUED`] entries, oldest dropped first;
//! - the **senders** of its open push subscriptions. A simulated delivery is
//!   encoded once as a push frame and fanned out to each of them. Senders whose
//!   subscription was released are pruned on every delivery and subscribe.
//!
//! A new subscription first receives every email still queued for the
//! mailbox, so an email simulated before the wait started is not missed.
//!
//! The service stops when every [`MailServiceClient`] has been dropped.

use super::client::MailServiceClient;
use super::message::ServiceRequest;
use crate::config::Credentials;
use crate::error::TransportError;
use crate::model::{EventBatch, EventRecord, Mailbox, PushFrame};
use crate::transport::subscription::FrameSender;
use crate::transport::Subscription;
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Emails kept per mailbox for polling and replay.
pub const MAX_QUEUED: usize = 100;

#[derive(Default)]
struct MailboxState {
    queued: VecDeque<EventRecord>,
    subscribers: Vec<FrameSender>,
}

impl MailboxState {
    fn open_subscriptions(&self) -> usize {
        self.subscribers.iter().filter(|s| !s.is_closed()).count()
    }
}

pub struct MailService {
    receiver: mpsc::Receiver<ServiceRequest>,
    domain: String,
    accepted: Option<String>,
    mailboxes: HashMap<Mailbox, MailboxState>,
    next_mailbox: u32,
    next_email: u64,
}

impl MailService {
    /// Creates the service and its client.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel.
    /// * `domain` - Domain part of every provisioned address.
    /// * `accepted` - The only credentials authenticated requests may use.
    ///   `None` rejects every authenticated request.
    pub fn new(
        buffer_size: usize,
        domain: impl Into<String>,
        accepted: Option<&Credentials>,
    ) -> (Self, MailServiceClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            domain: domain.into(),
            accepted: accepted.map(Credentials::authorization),
            mailboxes: HashMap::new(),
            next_mailbox: 1,
            next_email: 1,
        };
        (service, MailServiceClient::new(sender))
    }

    /// Processes requests until every client is gone.
    pub async fn run(mut self) {
        info!(domain = %self.domain, "Mail service started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ServiceRequest::CreateMailbox {
                    authorization,
                    name,
                    respond_to,
                } => {
                    let result = self
                        .authorize(&authorization)
                        .and_then(|()| self.create_mailbox(name));
                    let _ = respond_to.send(result);
                }
                ServiceRequest::Simulate {
                    authorization,
                    address,
                    subject,
                    respond_to,
                } => {
                    let result = self
                        .authorize(&authorization)
                        .and_then(|()| self.simulate(address, subject));
                    let _ = respond_to.send(result);
                }
                ServiceRequest::Fetch {
                    authorization,
                    address,
                    respond_to,
                } => {
                    let result = self
                        .authorize(&authorization)
                        .and_then(|()| self.fetch(&address));
                    let _ = respond_to.send(result);
                }
                ServiceRequest::Subscribe {
                    address,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.subscribe(address));
                }
                ServiceRequest::ActiveSubscriptions {
                    address,
                    respond_to,
                } => {
                    let count = self
                        .mailboxes
                        .get(&address)
                        .map_or(0, MailboxState::open_subscriptions);
                    let _ = respond_to.send(Ok(count));
                }
            }
        }

        info!(mailboxes = self.mailboxes.len(), "Mail service shutdown");
    }

    fn authorize(&self, authorization: &str) -> Result<(), TransportError> {
        match &self.accepted {
            Some(expected) if expected == authorization => Ok(()),
            _ => {
                warn!("Rejected request with invalid api key");
                Err(TransportError::status(401, "invalid api key"))
            }
        }
    }

    fn create_mailbox(&mut self, name: Option<String>) -> Result<Mailbox, TransportError> {
        let local = match name {
            Some(name) if name.trim().is_empty() => {
                return Err(TransportError::status(400, "mailbox name must not be blank"))
            }
            Some(name) => name,
            None => {
                let generated = format!("inbox-{}", self.next_mailbox);
                self.next_mailbox += 1;
                generated
            }
        };

        let address = Mailbox::parse(format!("{local}@{}", self.domain))
            .map_err(|e| TransportError::status(400, e.to_string()))?;
        if self.mailboxes.contains_key(&address) {
            return Err(TransportError::status(
                409,
                format!("mailbox {address} already exists"),
            ));
        }

        self.mailboxes.insert(address.clone(), MailboxState::default());
        info!(%address, size = self.mailboxes.len(), "Mailbox created");
        Ok(address)
    }

    fn simulate(&mut self, address: Mailbox, subject: String) -> Result<Mailbox, TransportError> {
        let id = self.next_email;
        let sender = format!("simulator@{}", self.domain);
        let state = self
            .mailboxes
            .get_mut(&address)
            .ok_or_else(|| unknown_mailbox(&address))?;

        let record = EventRecord::new(subject)
            .with_field("id", id)
            .with_field("from", sender)
            .with_field("to", address.as_str());
        let frame = PushFrame::encode(&record)?;
        self.next_email += 1;

        state
            .subscribers
            .retain(|subscriber| subscriber.send(frame.clone()).is_ok());
        let pushed = state.subscribers.len();
        if state.queued.len() == MAX_QUEUED {
            state.queued.pop_front();
        }
        state.queued.push_back(record);

        info!(%address, id, pushed, queued = state.queued.len(), "Simulated email delivered");
        Ok(address)
    }

    fn fetch(&mut self, address: &Mailbox) -> Result<EventBatch, TransportError> {
        let state = self
            .mailboxes
            .get_mut(address)
            .ok_or_else(|| unknown_mailbox(address))?;
        let emails: Vec<_> = state.queued.drain(..).collect();
        debug!(%address, emails = emails.len(), "Fetch");
        Ok(EventBatch::new(emails))
    }

    fn subscribe(&mut self, address: Mailbox) -> Result<Subscription, TransportError> {
        let state = self
            .mailboxes
            .get_mut(&address)
            .ok_or_else(|| unknown_mailbox(&address))?;
        let (sender, subscription) = Subscription::channel(address.clone());
        for record in &state.queued {
            // The receiver is still held by `subscription`, so this cannot fail.
            let _ = sender.send(PushFrame::encode(record)?);
        }
        state.subscribers.retain(|s| !s.is_closed());
        state.subscribers.push(sender);
        debug!(%address, open = state.subscribers.len(), replayed = state.queued.len(), "Subscribed");
        Ok(subscription)
    }
}

fn unknown_mailbox(address: &Mailbox) -> TransportError {
    warn!(%address, "Unknown mailbox");
    TransportError::status(404, format!("mailbox {address} not found"))
}
