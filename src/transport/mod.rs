//! # Transport Seams
//!
//! The waiter never talks to the network itself. It consumes three traits, one
//! per collaborator of the remote service:
//!
//! - [`ProvisioningClient`] - creates mailboxes and triggers simulated sends.
//! - [`PushTransport`] - opens a [`Subscription`] streaming raw push frames for
//!   one mailbox.
//! - [`PollTransport`] - request/response fetch of whatever is queued.
//!
//! Authenticated calls receive the [`Credentials`] explicitly; a transport
//! never reads global state. Errors are reported as [`TransportError`] and
//! travel to the caller unchanged.
//!
//! The in-memory [`MailServiceClient`](crate::service::MailServiceClient)
//! implements all three; [`mock`] has scripted doubles for unit tests.

pub mod mock;
pub mod subscription;

pub use subscription::Subscription;

use crate::config::Credentials;
use crate::error::TransportError;
use crate::model::{EventBatch, Mailbox};
use async_trait::async_trait;

/// Address provisioning and simulated delivery.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Creates a new disposable address, optionally with a chosen local part.
    async fn create_mailbox(
        &self,
        credentials: &Credentials,
        name: Option<&str>,
    ) -> Result<Mailbox, TransportError>;

    /// Asks the service to deliver a fake email with `subject` to `address`.
    /// Resolves with the address it was sent to.
    async fn trigger_simulated_delivery(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
        subject: &str,
    ) -> Result<Mailbox, TransportError>;
}

/// A long-lived channel of push frames keyed by mailbox.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Resolves once the subscription is established on the remote side.
    async fn subscribe(&self, address: &Mailbox) -> Result<Subscription, TransportError>;
}

/// Request/response access to a mailbox's queued emails.
#[async_trait]
pub trait PollTransport: Send + Sync {
    /// Returns the queued emails; an empty batch is a normal answer.
    async fn fetch(
        &self,
        credentials: &Credentials,
        address: &Mailbox,
    ) -> Result<EventBatch, TransportError>;
}
